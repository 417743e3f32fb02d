//! Error types for the organisation registry.

use connector_search_shared::ConnectorKind;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A referenced organisation, connector, or app is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The connector is already installed for the organisation.
    #[error("Connector {0} is already installed")]
    AlreadyInstalled(ConnectorKind),

    /// Malformed or contradictory update payload.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The operation did not complete within the caller's deadline.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// The backing store failed.
    #[error("Store error: {0}")]
    StoreError(String),
}

impl RegistryError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }
}
