//! Tag and category endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use boardhop_common::AppResult;
use boardhop_db::entities::{category, tag};
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Board type discriminator for the tag list.
#[derive(Debug, Default, Deserialize)]
pub struct ListTagsQuery {
    #[serde(rename = "type")]
    pub board_type: Option<String>,
}

async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> AppResult<ApiResponse<Vec<tag::Model>>> {
    let tags = state
        .taxonomy_service
        .list_tags(query.board_type.as_deref())
        .await?;
    Ok(ApiResponse::ok(tags))
}

async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<category::Model>>> {
    let categories = state.taxonomy_service.list_categories().await?;
    Ok(ApiResponse::ok(categories))
}

pub fn tags_router() -> Router<AppState> {
    Router::new().route("/", get(list_tags))
}

pub fn categories_router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}
