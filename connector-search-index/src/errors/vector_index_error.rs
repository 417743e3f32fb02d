//! Vector index error types.
//!
//! This module defines the error types that can occur during vector index
//! operations.

use thiserror::Error;

/// Errors that can occur during vector index operations.
#[derive(Debug, Clone, Error)]
pub enum VectorIndexError {
    /// Validation error (e.g., missing required fields).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A supplied vector's length does not match the configured embedding size.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    /// Failed to establish connection to the backing store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to upsert a document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Search query execution failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Failed to delete a document.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Failed to parse a response from the backing store.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// The operation did not complete within the caller's deadline.
    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

impl VectorIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::EmbeddingDimensionMismatch { expected, actual }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }
}
