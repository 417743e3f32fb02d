//! Request and result types for vector index operations.

use uuid::Uuid;

use crate::errors::VectorIndexError;

/// Which embedding a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Match against content embeddings.
    #[default]
    Content,
    /// Match against title embeddings.
    Title,
}

/// A nearest-neighbor query against one organisation's partition.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// The query embedding.
    pub vector: Vec<f32>,
    /// Maximum number of hits; the client's configured default applies
    /// when absent.
    pub limit: Option<usize>,
    /// Which embedding to match against.
    pub mode: SearchMode,
}

impl SearchQuery {
    /// Query against content embeddings.
    pub fn content(vector: Vec<f32>) -> Self {
        Self {
            vector,
            limit: None,
            mode: SearchMode::Content,
        }
    }

    /// Query against title embeddings.
    pub fn title(vector: Vec<f32>) -> Self {
        Self {
            vector,
            limit: None,
            mode: SearchMode::Title,
        }
    }

    /// Cap the number of hits.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Result of a batch operation for a single document.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document's identity.
    pub document_id: String,
    /// The organisation the document belongs to.
    pub organisation_id: Uuid,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<VectorIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and
/// individual results.
///
/// Upserts are atomic per document, not per batch: callers inspect
/// `results` to handle partial failures.
#[derive(Debug, Clone)]
pub struct BatchOperationSummary {
    /// Total number of documents in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each document.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Summary for an empty batch.
    pub fn empty() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            results: Vec::new(),
        }
    }

    /// Collect individual results into a summary.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// The failed entries only.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
