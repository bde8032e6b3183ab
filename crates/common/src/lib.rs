//! Shared types, config, and error definitions for the market proxy.

pub mod config;
pub mod error;
pub mod types;

pub use config::ProxyConfig;
pub use error::{Error, ErrorBody, ErrorResponse};
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
