//! HTTP API layer for boardhop.
//!
//! - **Endpoints**: posts, orders, messages, taxonomy and users
//! - **Auth**: bearer-token verification yielding a [`CallerIdentity`](boardhop_common::CallerIdentity)
//! - **Extractors**: authenticated caller and resolved user
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod auth;
pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use auth::{JwtVerifier, TokenVerifier};
pub use endpoints::router;
pub use middleware::AppState;
