//! In-memory vector index implementation.
//!
//! Tenant-partitioned map with full-scan cosine scoring. Used as the
//! default backend for local development and as the test double for the
//! provider seam.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::VectorIndexError;
use crate::interfaces::VectorIndexProvider;
use crate::types::{SearchMode, SearchQuery};
use connector_search_shared::{DocumentHit, IndexedDocument};

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0.0 when either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// In-memory, tenant-partitioned vector index.
///
/// Documents live in one `HashMap` per organisation keyed by document id,
/// so an upsert replaces the whole document atomically and a search can
/// only ever scan its own partition.
pub struct InMemoryVectorIndex {
    partitions: RwLock<HashMap<Uuid, HashMap<String, IndexedDocument>>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents stored for an organisation.
    pub async fn partition_len(&self, organisation_id: Uuid) -> usize {
        self.partitions
            .read()
            .await
            .get(&organisation_id)
            .map(|p| p.len())
            .unwrap_or(0)
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndexProvider for InMemoryVectorIndex {
    async fn upsert_document(&self, document: &IndexedDocument) -> Result<(), VectorIndexError> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(document.organisation_id)
            .or_default()
            .insert(document.id.clone(), document.clone());

        debug!(
            document_id = %document.id,
            organisation_id = %document.organisation_id,
            "Upserted document"
        );
        Ok(())
    }

    async fn search(
        &self,
        organisation_id: Uuid,
        query: &SearchQuery,
    ) -> Result<Vec<DocumentHit>, VectorIndexError> {
        let partitions = self.partitions.read().await;
        let Some(partition) = partitions.get(&organisation_id) else {
            return Ok(vec![]);
        };

        let mut scored: Vec<(f32, &IndexedDocument)> = partition
            .values()
            .map(|doc| {
                let stored = match query.mode {
                    SearchMode::Content => &doc.content_vector,
                    SearchMode::Title => &doc.title_vector,
                };
                (cosine_similarity(&query.vector, stored), doc)
            })
            .collect();

        // Closest first; equal scores order by most recent update, then id
        // for determinism.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.updated_at.cmp(&a.1.updated_at))
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        let limit = query.limit.unwrap_or(usize::MAX);
        let hits = scored
            .into_iter()
            .take(limit)
            .map(|(score, doc)| DocumentHit::from_document(doc, score))
            .collect();

        Ok(hits)
    }

    async fn delete_document(
        &self,
        organisation_id: Uuid,
        document_id: &str,
    ) -> Result<(), VectorIndexError> {
        let mut partitions = self.partitions.write().await;
        if let Some(partition) = partitions.get_mut(&organisation_id) {
            partition.remove(document_id);
        }
        Ok(())
    }

    async fn ensure_ready(&self) -> Result<(), VectorIndexError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, VectorIndexError> {
        Ok(true)
    }
}
