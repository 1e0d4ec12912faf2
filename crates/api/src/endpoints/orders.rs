//! Order endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use boardhop_common::AppResult;
use boardhop_core::CreateOrderInput;
use boardhop_db::views::{OrderAggregate, OrderSummary};
use serde::Deserialize;

use crate::{
    extractors::CurrentUser,
    middleware::AppState,
    response::{ApiResponse, Created},
};

/// Page parameters of the order list.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub p: Option<String>,
    pub l: Option<String>,
}

/// List the caller's orders.
async fn list_orders(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<ApiResponse<Vec<OrderSummary>>> {
    let orders = state
        .order_service
        .list(&user.id, query.p.as_deref(), query.l.as_deref())
        .await?;
    Ok(ApiResponse::ok(orders))
}

/// Get an order the caller rented or whose post the caller owns.
async fn get_order(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<ApiResponse<OrderAggregate>> {
    let order = state.order_service.get(&user.id, &order_id).await?;
    Ok(ApiResponse::ok(order))
}

/// Place an order, optionally with its first message.
async fn create_order(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<ApiResponse<Created>> {
    let id = state.order_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(Created { id }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
}
