//! Store errors

use thiserror::Error;

/// Errors raised at the store boundary
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Invalid tree path: {0}")]
    InvalidPath(String),

    #[error("Node is not an object: {0}")]
    NotAnObject(String),

    /// The backend rejected or could not service the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
