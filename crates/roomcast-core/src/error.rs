//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur in core domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier was empty where a value is required
    #[error("{kind} must not be empty")]
    EmptyIdentifier { kind: &'static str },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
