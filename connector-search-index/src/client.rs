//! Vector index client implementation.
//!
//! This module provides the main client for interacting with the vector
//! index. Application code uses this to upsert, search, and delete
//! documents; the client validates every request before delegating to the
//! injected provider.

use std::future::Future;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::VectorIndexConfig;
use crate::errors::VectorIndexError;
use crate::interfaces::VectorIndexProvider;
use crate::types::{BatchOperationResult, BatchOperationSummary, SearchQuery};
use connector_search_shared::{DocumentHit, IndexedDocument};

/// The main client for interacting with the vector index.
///
/// Validates embedding dimensions, batch sizes, and partition scoping, and
/// applies the configured operation deadline. Storage and scoring are
/// delegated to the injected [`VectorIndexProvider`].
pub struct VectorIndexClient {
    provider: Box<dyn VectorIndexProvider>,
    config: VectorIndexConfig,
}

impl VectorIndexClient {
    /// Create a new client around the given provider.
    pub fn new(provider: Box<dyn VectorIndexProvider>, config: VectorIndexConfig) -> Self {
        Self { provider, config }
    }

    /// The configured embedding size.
    pub fn embedding_size(&self) -> usize {
        self.config.embedding_size
    }

    /// Apply the configured operation deadline to a provider call.
    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, VectorIndexError>
    where
        F: Future<Output = Result<T, VectorIndexError>>,
    {
        match self.config.op_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut)
                .await
                .map_err(|_| VectorIndexError::DeadlineExceeded)?,
            None => fut.await,
        }
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), VectorIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(VectorIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Validate a single document against the partition and the configured
    /// embedding size.
    fn validate_document(
        &self,
        organisation_id: Uuid,
        document: &IndexedDocument,
    ) -> Result<(), VectorIndexError> {
        if document.id.is_empty() {
            return Err(VectorIndexError::validation("document id is required"));
        }
        if document.organisation_id != organisation_id {
            return Err(VectorIndexError::validation(format!(
                "document {} belongs to organisation {}, not {}",
                document.id, document.organisation_id, organisation_id
            )));
        }
        if document.title_vector.len() != self.config.embedding_size {
            return Err(VectorIndexError::dimension_mismatch(
                self.config.embedding_size,
                document.title_vector.len(),
            ));
        }
        if document.content_vector.len() != self.config.embedding_size {
            return Err(VectorIndexError::dimension_mismatch(
                self.config.embedding_size,
                document.content_vector.len(),
            ));
        }
        Ok(())
    }

    /// Upsert a batch of documents into one organisation's partition.
    ///
    /// Each document is upserted atomically by id; the batch as a whole is
    /// not atomic. Per-document failures (validation or provider) are
    /// reported in the returned summary rather than aborting the rest of
    /// the batch.
    ///
    /// The batch size is limited by the configured `max_batch_size`.
    pub async fn add_documents(
        &self,
        organisation_id: Uuid,
        documents: Vec<IndexedDocument>,
    ) -> Result<BatchOperationSummary, VectorIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        self.validate_batch_size(documents.len())?;

        self.with_deadline(async {
            let mut results = Vec::with_capacity(documents.len());

            for document in &documents {
                let outcome = match self.validate_document(organisation_id, document) {
                    Ok(()) => self.provider.upsert_document(document).await,
                    Err(e) => Err(e),
                };

                if let Err(ref e) = outcome {
                    warn!(
                        document_id = %document.id,
                        organisation_id = %organisation_id,
                        error = %e,
                        "Failed to upsert document"
                    );
                }

                results.push(BatchOperationResult {
                    document_id: document.id.clone(),
                    organisation_id,
                    success: outcome.is_ok(),
                    error: outcome.err(),
                });
            }

            let summary = BatchOperationSummary::from_results(results);
            debug!(
                organisation_id = %organisation_id,
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Upserted document batch"
            );
            Ok(summary)
        })
        .await
    }

    /// Search one organisation's partition for the nearest documents.
    ///
    /// Results are ordered closest first and never include documents from
    /// another organisation. An organisation with no documents yields an
    /// empty result.
    pub async fn search_documents(
        &self,
        organisation_id: Uuid,
        query: SearchQuery,
    ) -> Result<Vec<DocumentHit>, VectorIndexError> {
        if query.vector.len() != self.config.embedding_size {
            return Err(VectorIndexError::dimension_mismatch(
                self.config.embedding_size,
                query.vector.len(),
            ));
        }

        let query = SearchQuery {
            limit: Some(query.limit.unwrap_or(self.config.default_top_k)),
            ..query
        };

        self.with_deadline(self.provider.search(organisation_id, &query))
            .await
    }

    /// Delete a document from one organisation's partition.
    ///
    /// Deleting a document that does not exist is a successful no-op.
    pub async fn delete_document(
        &self,
        organisation_id: Uuid,
        document_id: &str,
    ) -> Result<(), VectorIndexError> {
        if document_id.is_empty() {
            return Err(VectorIndexError::validation("document id is required"));
        }

        self.with_deadline(self.provider.delete_document(organisation_id, document_id))
            .await
    }

    /// Prepare the backing store. Called during application startup.
    pub async fn ensure_ready(&self) -> Result<(), VectorIndexError> {
        self.provider.ensure_ready().await
    }

    /// Check whether the backing store is reachable and healthy.
    pub async fn health_check(&self) -> Result<bool, VectorIndexError> {
        self.provider.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connector_search_shared::ConnectorKind;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Mock provider for testing.
    struct MockProvider {
        upserted: Arc<Mutex<Vec<IndexedDocument>>>,
        fail_document_id: Option<String>,
    }

    impl MockProvider {
        fn new() -> Self {
            Self {
                upserted: Arc::new(Mutex::new(Vec::new())),
                fail_document_id: None,
            }
        }

        fn failing_on(document_id: &str) -> Self {
            Self {
                upserted: Arc::new(Mutex::new(Vec::new())),
                fail_document_id: Some(document_id.to_string()),
            }
        }
    }

    #[async_trait]
    impl VectorIndexProvider for MockProvider {
        async fn upsert_document(
            &self,
            document: &IndexedDocument,
        ) -> Result<(), VectorIndexError> {
            if self.fail_document_id.as_deref() == Some(document.id.as_str()) {
                return Err(VectorIndexError::index("mock failure"));
            }
            self.upserted.lock().await.push(document.clone());
            Ok(())
        }

        async fn search(
            &self,
            _organisation_id: Uuid,
            _query: &SearchQuery,
        ) -> Result<Vec<DocumentHit>, VectorIndexError> {
            Ok(vec![])
        }

        async fn delete_document(
            &self,
            _organisation_id: Uuid,
            _document_id: &str,
        ) -> Result<(), VectorIndexError> {
            Ok(())
        }

        async fn ensure_ready(&self) -> Result<(), VectorIndexError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, VectorIndexError> {
            Ok(true)
        }
    }

    fn test_document(organisation_id: Uuid, id: &str, dims: usize) -> IndexedDocument {
        let mut doc = IndexedDocument::new(
            id,
            organisation_id,
            ConnectorKind::Notion,
            "title",
            "content",
        );
        doc.title_vector = vec![0.1; dims];
        doc.content_vector = vec![0.2; dims];
        doc
    }

    #[tokio::test]
    async fn test_add_documents_empty() {
        let client = VectorIndexClient::new(Box::new(MockProvider::new()), VectorIndexConfig::new(3));

        let summary = client
            .add_documents(Uuid::new_v4(), vec![])
            .await
            .unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
        assert!(summary.results.is_empty());
    }

    #[tokio::test]
    async fn test_add_documents_success() {
        let client = VectorIndexClient::new(Box::new(MockProvider::new()), VectorIndexConfig::new(3));
        let org = Uuid::new_v4();

        let summary = client
            .add_documents(org, vec![test_document(org, "d1", 3), test_document(org, "d2", 3)])
            .await
            .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
        assert!(summary.results.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn test_add_documents_dimension_mismatch_is_per_document() {
        let client = VectorIndexClient::new(Box::new(MockProvider::new()), VectorIndexConfig::new(3));
        let org = Uuid::new_v4();

        let summary = client
            .add_documents(org, vec![test_document(org, "good", 3), test_document(org, "bad", 2)])
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);

        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.document_id, "bad");
        assert!(matches!(
            failure.error,
            Some(VectorIndexError::EmbeddingDimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[tokio::test]
    async fn test_add_documents_provider_failure_is_per_document() {
        let client = VectorIndexClient::new(
            Box::new(MockProvider::failing_on("d2")),
            VectorIndexConfig::new(3),
        );
        let org = Uuid::new_v4();

        let summary = client
            .add_documents(
                org,
                vec![
                    test_document(org, "d1", 3),
                    test_document(org, "d2", 3),
                    test_document(org, "d3", 3),
                ],
            )
            .await
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures().next().unwrap().document_id, "d2");
    }

    #[tokio::test]
    async fn test_add_documents_wrong_partition_rejected() {
        let client = VectorIndexClient::new(Box::new(MockProvider::new()), VectorIndexConfig::new(3));
        let org_a = Uuid::new_v4();
        let org_b = Uuid::new_v4();

        let summary = client
            .add_documents(org_a, vec![test_document(org_b, "d1", 3)])
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert!(matches!(
            summary.results[0].error,
            Some(VectorIndexError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_add_documents_batch_size_exceeded() {
        let config = VectorIndexConfig::new(3).with_max_batch_size(2);
        let client = VectorIndexClient::new(Box::new(MockProvider::new()), config);
        let org = Uuid::new_v4();

        let documents = (0..5)
            .map(|i| test_document(org, &format!("d{}", i), 3))
            .collect();

        let result = client.add_documents(org, documents).await;
        assert!(matches!(
            result.unwrap_err(),
            VectorIndexError::BatchSizeExceeded { provided: 5, max: 2 }
        ));
    }

    #[tokio::test]
    async fn test_search_rejects_wrong_query_dimension() {
        let client = VectorIndexClient::new(Box::new(MockProvider::new()), VectorIndexConfig::new(3));

        let result = client
            .search_documents(Uuid::new_v4(), SearchQuery::content(vec![1.0, 2.0]))
            .await;

        assert!(matches!(
            result.unwrap_err(),
            VectorIndexError::EmbeddingDimensionMismatch { expected: 3, actual: 2 }
        ));
    }

    #[tokio::test]
    async fn test_delete_rejects_empty_id() {
        let client = VectorIndexClient::new(Box::new(MockProvider::new()), VectorIndexConfig::new(3));

        let result = client.delete_document(Uuid::new_v4(), "").await;
        assert!(matches!(
            result.unwrap_err(),
            VectorIndexError::ValidationError(_)
        ));
    }

    /// Provider whose upsert never completes, for deadline tests.
    struct StalledProvider;

    #[async_trait]
    impl VectorIndexProvider for StalledProvider {
        async fn upsert_document(&self, _document: &IndexedDocument) -> Result<(), VectorIndexError> {
            std::future::pending().await
        }

        async fn search(
            &self,
            _organisation_id: Uuid,
            _query: &SearchQuery,
        ) -> Result<Vec<DocumentHit>, VectorIndexError> {
            std::future::pending().await
        }

        async fn delete_document(
            &self,
            _organisation_id: Uuid,
            _document_id: &str,
        ) -> Result<(), VectorIndexError> {
            Ok(())
        }

        async fn ensure_ready(&self) -> Result<(), VectorIndexError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, VectorIndexError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let config = VectorIndexConfig::new(3).with_op_timeout(Duration::from_millis(10));
        let client = VectorIndexClient::new(Box::new(StalledProvider), config);
        let org = Uuid::new_v4();

        let result = client
            .add_documents(org, vec![test_document(org, "d1", 3)])
            .await;

        assert!(matches!(
            result.unwrap_err(),
            VectorIndexError::DeadlineExceeded
        ));
    }
}
