//! Core business logic for boardhop.

pub mod services;

pub use services::*;
