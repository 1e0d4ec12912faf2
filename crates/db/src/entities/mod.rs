//! Database entities.

#![allow(missing_docs)]

pub mod category;
pub mod message;
pub mod order;
pub mod post;
pub mod post_category;
pub mod post_media;
pub mod post_tag;
pub mod tag;
pub mod user;

pub use category::Entity as Category;
pub use message::Entity as Message;
pub use order::Entity as Order;
pub use post::Entity as Post;
pub use post_category::Entity as PostCategory;
pub use post_media::Entity as PostMedia;
pub use post_tag::Entity as PostTag;
pub use tag::Entity as Tag;
pub use user::Entity as User;
