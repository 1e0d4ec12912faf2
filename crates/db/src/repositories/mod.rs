//! Repositories for database operations.
//!
//! Each repository holds the pool and runs every call in the transaction its
//! [`TxScope`](crate::TxScope) argument selects.

pub mod message;
pub mod order;
pub mod post;
pub mod taxonomy;
pub mod user;

pub use message::MessageRepository;
pub use order::OrderRepository;
pub use post::PostRepository;
pub use taxonomy::TaxonomyRepository;
pub use user::UserRepository;
