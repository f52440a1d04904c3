//! Registry error types.
//!
//! Subscribe and unsubscribe operations never fail; errors only come out of
//! configuration handling.

use thiserror::Error;

/// Registry errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for fallible registry APIs.
pub type Result<T> = std::result::Result<T, Error>;
