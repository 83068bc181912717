//! Error types for the cache facade
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache facade.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Transport or server failure reported by the Redis client
    #[error("Store error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A primitive call did not complete within the configured command timeout
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// The connection was released by teardown
    #[error("Connection closed")]
    Closed,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid connection configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Connection setup failed (e.g. the on-connect hook rejected it)
    #[error("Connection failed: {0}")]
    Connection(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache facade.
pub type Result<T> = std::result::Result<T, CacheError>;
