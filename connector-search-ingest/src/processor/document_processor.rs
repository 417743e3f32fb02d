//! Document processor implementation.
//!
//! Transforms crawled source records into IndexedDocument structures with
//! title and content embeddings.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::connectors::SourceRecord;
use crate::errors::IngestError;
use crate::processor::Embedder;
use connector_search_shared::{ConnectorKind, IndexedDocument};

/// Processor that embeds source records into indexable documents.
pub struct DocumentProcessor {
    embedder: Arc<dyn Embedder>,
}

impl DocumentProcessor {
    /// Create a processor over the given embedder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Process a batch of records crawled from one connector for one
    /// organisation.
    ///
    /// Records with no content are skipped. Titles and contents are
    /// embedded in two batch calls; both vectors for a document come from
    /// the same pass, so a document is either fully embedded or not
    /// produced at all.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub async fn process_batch(
        &self,
        organisation_id: Uuid,
        source: ConnectorKind,
        records: Vec<SourceRecord>,
    ) -> Result<Vec<IndexedDocument>, IngestError> {
        let records: Vec<SourceRecord> = records
            .into_iter()
            .filter(|record| {
                if record.id.trim().is_empty() || record.content.trim().is_empty() {
                    debug!(record_id = %record.id, "Skipping record with no id or content");
                    false
                } else {
                    true
                }
            })
            .collect();

        if records.is_empty() {
            return Ok(vec![]);
        }

        let titles: Vec<String> = records.iter().map(|r| r.title.clone()).collect();
        let contents: Vec<String> = records.iter().map(|r| r.content.clone()).collect();

        let title_vectors = self.embedder.embed(&titles).await?;
        let content_vectors = self.embedder.embed(&contents).await?;

        if title_vectors.len() != records.len() || content_vectors.len() != records.len() {
            return Err(IngestError::processor(format!(
                "embedder returned {} title and {} content vectors for {} records",
                title_vectors.len(),
                content_vectors.len(),
                records.len()
            )));
        }

        let now = Utc::now();
        let documents = records
            .into_iter()
            .zip(title_vectors.into_iter().zip(content_vectors))
            .map(|(record, (title_vector, content_vector))| IndexedDocument {
                id: record.id,
                organisation_id,
                title: record.title,
                title_vector,
                source,
                content: record.content,
                content_vector,
                metadata: record.metadata,
                updated_at: now,
            })
            .collect::<Vec<_>>();

        debug!(document_count = documents.len(), "Processed record batch");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic embedder: vector derived from text length.
    struct StubEmbedder {
        dimensions: usize,
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; self.dimensions];
                    v[0] = t.len() as f32;
                    v
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    fn record(id: &str, title: &str, content: &str) -> SourceRecord {
        SourceRecord {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            metadata: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_process_batch_embeds_both_vectors() {
        let processor = DocumentProcessor::new(Arc::new(StubEmbedder { dimensions: 3 }));
        let org = Uuid::new_v4();

        let documents = processor
            .process_batch(
                org,
                ConnectorKind::WebConnector,
                vec![record("r1", "title", "some content")],
            )
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        let doc = &documents[0];
        assert_eq!(doc.id, "r1");
        assert_eq!(doc.organisation_id, org);
        assert_eq!(doc.source, ConnectorKind::WebConnector);
        assert_eq!(doc.title_vector.len(), 3);
        assert_eq!(doc.content_vector.len(), 3);
        assert_eq!(doc.title_vector[0], "title".len() as f32);
        assert_eq!(doc.content_vector[0], "some content".len() as f32);
    }

    #[tokio::test]
    async fn test_skips_records_without_content() {
        let processor = DocumentProcessor::new(Arc::new(StubEmbedder { dimensions: 3 }));

        let documents = processor
            .process_batch(
                Uuid::new_v4(),
                ConnectorKind::Notion,
                vec![
                    record("r1", "title", ""),
                    record("", "title", "content"),
                    record("r3", "title", "content"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "r3");
    }

    #[tokio::test]
    async fn test_empty_batch_is_empty() {
        let processor = DocumentProcessor::new(Arc::new(StubEmbedder { dimensions: 3 }));

        let documents = processor
            .process_batch(Uuid::new_v4(), ConnectorKind::Notion, vec![])
            .await
            .unwrap();

        assert!(documents.is_empty());
    }
}
