//! User endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use boardhop_common::AppResult;
use boardhop_core::SignupInput;
use boardhop_db::entities::user;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Register the caller's identity as a user.
async fn signup(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.user_service.signup(&identity, input).await?;
    Ok(ApiResponse::created(user))
}

/// The caller's own account.
async fn me(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.user_service.me(&identity).await?;
    Ok(ApiResponse::ok(user))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<user::Model>> {
    let user = state.user_service.get(&user_id).await?;
    Ok(ApiResponse::ok(user))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(signup))
        .route("/me", get(me))
        .route("/{id}", get(get_user))
}
