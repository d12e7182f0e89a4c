//! Application-wide error type
//!
//! Unifies domain errors, store errors and infrastructure failures behind a
//! single error the engines return.

use hall_core::error::DomainError;
use hall_store::StoreError;
use thiserror::Error;

/// Result alias used throughout the engines.
pub type AppResult<T> = Result<T, AppError>;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    /// Domain rule violation
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Store access failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Payload (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request validation failure
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// An awaited signal did not arrive in time
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// Unexpected internal error
    #[error("Internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable error code for logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Store(_) => "STORE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the failure is a missing entity rather than a fault.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_not_found())
    }

    #[must_use]
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
