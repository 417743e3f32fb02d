//! Loader module for the ingestion pipeline.
//!
//! Loads processed documents into the vector index in batches.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::IngestError;
use connector_search_index::VectorIndexClient;
use connector_search_shared::IndexedDocument;

/// Configuration for the index loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents per organisation to buffer before flushing.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Loader that upserts documents into the vector index.
///
/// Documents are buffered per organisation (upserts are partition-scoped)
/// and flushed when the buffer reaches the batch size or on an explicit
/// [`flush`](IndexLoader::flush). Per-document failures reported by the
/// index are logged and surfaced as a loader error carrying the count.
pub struct IndexLoader {
    client: Arc<VectorIndexClient>,
    config: LoaderConfig,
    pending: HashMap<Uuid, Vec<IndexedDocument>>,
}

impl IndexLoader {
    /// Create a loader with the default configuration.
    pub fn new(client: Arc<VectorIndexClient>) -> Self {
        Self {
            client,
            config: LoaderConfig::default(),
            pending: HashMap::new(),
        }
    }

    /// Create a loader with custom configuration.
    pub fn with_config(client: Arc<VectorIndexClient>, config: LoaderConfig) -> Self {
        Self {
            client,
            config,
            pending: HashMap::new(),
        }
    }

    /// Buffer documents and flush every organisation whose buffer reached
    /// the batch size.
    #[instrument(skip(self, documents), fields(document_count = documents.len()))]
    pub async fn load(&mut self, documents: Vec<IndexedDocument>) -> Result<(), IngestError> {
        for document in documents {
            self.pending
                .entry(document.organisation_id)
                .or_default()
                .push(document);
        }

        let full: Vec<Uuid> = self
            .pending
            .iter()
            .filter(|(_, docs)| docs.len() >= self.config.batch_size)
            .map(|(org, _)| *org)
            .collect();

        for organisation_id in full {
            self.flush_organisation(organisation_id).await?;
        }

        Ok(())
    }

    /// Flush all buffered documents.
    #[instrument(skip(self))]
    pub async fn flush(&mut self) -> Result<(), IngestError> {
        let organisations: Vec<Uuid> = self.pending.keys().copied().collect();
        for organisation_id in organisations {
            self.flush_organisation(organisation_id).await?;
        }
        Ok(())
    }

    async fn flush_organisation(&mut self, organisation_id: Uuid) -> Result<(), IngestError> {
        let Some(documents) = self.pending.remove(&organisation_id) else {
            return Ok(());
        };
        if documents.is_empty() {
            return Ok(());
        }

        let count = documents.len();
        info!(
            organisation_id = %organisation_id,
            count = count,
            "Flushing documents to vector index"
        );

        let summary = self.client.add_documents(organisation_id, documents).await?;

        for failure in summary.failures() {
            warn!(
                organisation_id = %organisation_id,
                document_id = %failure.document_id,
                error = ?failure.error,
                "Failed to index document"
            );
        }

        if summary.failed > 0 {
            return Err(IngestError::loader(format!(
                "failed to index {} of {} documents",
                summary.failed, summary.total
            )));
        }

        debug!(
            organisation_id = %organisation_id,
            count = summary.succeeded,
            "Indexed documents"
        );
        Ok(())
    }

    /// Number of buffered documents across all organisations.
    pub fn pending_len(&self) -> usize {
        self.pending.values().map(|docs| docs.len()).sum()
    }
}
