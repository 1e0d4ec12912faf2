//! Common utilities and shared types for boardhop.
//!
//! This crate provides foundational components used across all boardhop crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Identity**: The authenticated caller via [`CallerIdentity`]
//! - **Storage**: Blob storage backends (local, in-memory, S3-compatible)
//!
//! # Example
//!
//! ```no_run
//! use boardhop_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     println!("Listening on port {} with first id {}", config.server.port, id_gen.generate());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod identity;
pub mod storage;

pub use config::{AuthConfig, Config, ListingConfig, MediaConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use identity::CallerIdentity;
pub use storage::{
    LocalStorage, MemoryStorage, StorageBackend, StorageConfig, StorageService, UploadedFile,
    media_key,
};
