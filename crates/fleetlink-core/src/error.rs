//! Shared error taxonomy.

use thiserror::Error;

/// Result type for fleetlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fleetlink error types.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No record matched the given key.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Underlying record store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
