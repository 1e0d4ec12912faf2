//! Message endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use boardhop_common::AppResult;
use boardhop_core::CreateMessageInput;

use crate::{extractors::CurrentUser, middleware::AppState};

/// Post a message to a post or order thread.
async fn create_message(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateMessageInput>,
) -> AppResult<StatusCode> {
    state.message_service.create(&user.id, input).await?;
    Ok(StatusCode::CREATED)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_message))
}
