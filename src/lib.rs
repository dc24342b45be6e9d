//! OneWord - client-side logic for a one-word-a-day social feed
//!
//! This library provides word validation, per-element rate limiting and
//! optimistic reaction, follow and delete flows on top of a hosted backend
//! reached through storage and auth traits.

pub mod admin;
pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod feed;
pub mod models;
pub mod storage;
pub mod validation;

// Re-export main components
pub use config::*;
pub use constants::*;
pub use error::{OneWordError, Result};
