//! Error types for the ingestion pipeline.

use connector_search_index::VectorIndexError;
use thiserror::Error;

use crate::limiter::RateLimitError;

/// Errors that can occur in the ingestion pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Rate limiter rejected or timed out the crawl.
    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// Error from a connector crawl client.
    #[error("Connector error: {0}")]
    ConnectorError(String),

    /// Error from the document processor.
    #[error("Processor error: {0}")]
    ProcessorError(String),

    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Error from the vector index.
    #[error("Index error: {0}")]
    IndexError(#[from] VectorIndexError),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Ingestion was cancelled or interrupted.
    #[error("Ingestion cancelled")]
    Cancelled,
}

impl IngestError {
    /// Create a connector error.
    pub fn connector(msg: impl Into<String>) -> Self {
        Self::ConnectorError(msg.into())
    }

    /// Create a processor error.
    pub fn processor(msg: impl Into<String>) -> Self {
        Self::ProcessorError(msg.into())
    }

    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }

    /// Create a channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::ChannelError(msg.into())
    }
}
