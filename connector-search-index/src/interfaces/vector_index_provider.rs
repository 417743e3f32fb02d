//! Vector index provider trait definition.
//!
//! This module defines the abstract interface for vector index operations,
//! allowing for different backend implementations (Qdrant, in-memory, etc.).

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::VectorIndexError;
use crate::types::SearchQuery;
use connector_search_shared::{DocumentHit, IndexedDocument};

/// Abstracts the underlying vector index implementation.
///
/// Implementations are injected into [`VectorIndexClient`] to enable
/// dependency injection and easy testing with mock implementations.
/// The client performs all validation (dimensions, batch size, deadlines);
/// providers only implement storage and scoring.
///
/// # Tenant isolation
///
/// Every method is scoped to an organisation partition. An implementation
/// must never let a search or delete reach across partitions.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async
/// tasks.
///
/// [`VectorIndexClient`]: crate::client::VectorIndexClient
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    /// Insert or replace a single document in its organisation's partition.
    ///
    /// The document id is the upsert key: a document with the same id in
    /// the same partition is replaced as one atomic operation. A partial
    /// write (title vector stored, content vector not) is a consistency
    /// violation.
    async fn upsert_document(&self, document: &IndexedDocument) -> Result<(), VectorIndexError>;

    /// Return up to `query.limit` documents from `organisation_id`'s
    /// partition, ordered by decreasing similarity to the query vector.
    ///
    /// Equal-similarity ties are broken by most recent `updated_at`. An
    /// organisation with no documents yields an empty result, not an
    /// error.
    async fn search(
        &self,
        organisation_id: Uuid,
        query: &SearchQuery,
    ) -> Result<Vec<DocumentHit>, VectorIndexError>;

    /// Delete a document from its organisation's partition.
    ///
    /// Deleting a document that does not exist is a successful no-op.
    async fn delete_document(
        &self,
        organisation_id: Uuid,
        document_id: &str,
    ) -> Result<(), VectorIndexError>;

    /// Prepare the backing store (create collections/indices as needed).
    ///
    /// Called during application startup.
    async fn ensure_ready(&self) -> Result<(), VectorIndexError>;

    /// Check whether the backing store is reachable and healthy.
    async fn health_check(&self) -> Result<bool, VectorIndexError>;
}
