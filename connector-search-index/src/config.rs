//! Configuration types for the VectorIndexClient.

use std::time::Duration;

/// Configuration for the VectorIndexClient.
#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    /// Embedding size every stored and queried vector must match.
    pub embedding_size: usize,
    /// Maximum number of documents allowed in a single batch operation.
    /// Set to None to disable the limit.
    pub max_batch_size: Option<usize>,
    /// Default number of hits returned by a search when the query does not
    /// specify one.
    pub default_top_k: usize,
    /// Deadline applied to each client operation. Set to None to disable.
    pub op_timeout: Option<Duration>,
}

impl VectorIndexConfig {
    /// Create a config for the given embedding size with default limits.
    pub fn new(embedding_size: usize) -> Self {
        Self {
            embedding_size,
            max_batch_size: Some(1000),
            default_top_k: 10,
            op_timeout: None,
        }
    }

    /// Set a custom batch size limit.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    /// Remove the batch size limit (use with caution).
    pub fn unlimited(mut self) -> Self {
        self.max_batch_size = None;
        self
    }

    /// Set the default search result count.
    pub fn with_default_top_k(mut self, k: usize) -> Self {
        self.default_top_k = k;
        self
    }

    /// Apply a deadline to every client operation.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = Some(timeout);
        self
    }
}
