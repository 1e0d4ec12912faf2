//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use boardhop_core::{MessageService, OrderService, PostService, TaxonomyService, UserService};

use crate::auth::TokenVerifier;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub post_service: PostService,
    pub order_service: OrderService,
    pub message_service: MessageService,
    pub taxonomy_service: TaxonomyService,
    pub user_service: UserService,
    pub token_verifier: Arc<dyn TokenVerifier>,
}

/// Authentication middleware.
///
/// A request without a bearer token passes through anonymously. A bearer
/// token that fails verification is rejected with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.token_verifier.verify(token.trim()) {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
            }
            Err(err) => return err.into_response(),
        }
    }

    next.run(req).await
}
