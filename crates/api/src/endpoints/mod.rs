//! API endpoints.

#![allow(missing_docs)]

mod messages;
mod orders;
mod posts;
mod taxonomy;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::router())
        .nest("/orders", orders::router())
        .nest("/messages", messages::router())
        .nest("/tags", taxonomy::tags_router())
        .nest("/categories", taxonomy::categories_router())
        .nest("/users", users::router())
}
