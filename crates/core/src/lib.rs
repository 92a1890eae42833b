//! Shared primitives for all Frostline connector crates.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Frostline crates.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Common connector error categories.
///
/// Remote failures are propagated unchanged to the caller; the event
/// delivery loop decides whether the same event is retried. Validation
/// and not-found errors are fatal for the event that produced them.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Invalid input or violated invariant, such as an incomplete server
    /// descriptor or an access record without a recognizable consumer.
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced resource does not exist in the catalog or the warehouse.
    #[error("not found: {0}")]
    NotFound(String),

    /// A remote call to the catalog or the warehouse failed.
    #[error("remote call failed: {0}")]
    Remote(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
