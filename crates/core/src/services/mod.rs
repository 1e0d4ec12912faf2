//! Business logic services.

#![allow(missing_docs)]

pub mod media;
pub mod message;
pub mod order;
pub mod post;
pub mod taxonomy;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use media::{MediaSlot, MediaUpload};
pub use message::{CreateMessageInput, MessageService};
pub use order::{CreateOrderInput, OrderService};
pub use post::{CreatePostInput, PostService, UpdatePostInput};
pub use taxonomy::TaxonomyService;
pub use user::{SignupInput, UserService};
