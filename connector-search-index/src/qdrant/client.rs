//! Qdrant client implementation.
//!
//! This module provides the concrete implementation of
//! `VectorIndexProvider` against Qdrant's REST API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use crate::errors::VectorIndexError;
use crate::interfaces::VectorIndexProvider;
use crate::qdrant::collection::{collection_settings, organisation_index_settings, CollectionConfig};
use crate::qdrant::queries::{
    build_delete_body, build_search_body, build_upsert_body, ScoredPoint,
};
use crate::types::SearchQuery;
use connector_search_shared::{DocumentHit, IndexedDocument};

/// Response wrapper returned by Qdrant's search endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    result: Vec<ScoredPoint>,
}

/// Qdrant-backed vector index.
///
/// Documents are stored as points with named `title`/`content` vectors and
/// an indexed `organisation_id` payload field; every search carries a
/// partition filter on that field, so tenant isolation is enforced by the
/// query itself.
pub struct QdrantVectorIndex {
    http: reqwest::Client,
    base_url: Url,
    config: CollectionConfig,
}

impl QdrantVectorIndex {
    /// Create a new Qdrant index client for the given server URL.
    pub fn new(url: &str, config: CollectionConfig) -> Result<Self, VectorIndexError> {
        let base_url = Url::parse(url).map_err(|e| VectorIndexError::connection(e.to_string()))?;

        info!(
            url = %url,
            collection = %config.name,
            embedding_size = config.embedding_size,
            "Created Qdrant index client"
        );

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, VectorIndexError> {
        self.base_url
            .join(path)
            .map_err(|e| VectorIndexError::connection(e.to_string()))
    }

    /// Fail with the response body when Qdrant reports an error status.
    async fn check_status(
        response: reqwest::Response,
        make_error: fn(String) -> VectorIndexError,
    ) -> Result<reqwest::Response, VectorIndexError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Qdrant request failed");
        Err(make_error(format!("status {}: {}", status, body)))
    }
}

#[async_trait]
impl VectorIndexProvider for QdrantVectorIndex {
    async fn upsert_document(&self, document: &IndexedDocument) -> Result<(), VectorIndexError> {
        let url = self.endpoint(&format!("collections/{}/points?wait=true", self.config.name))?;

        let response = self
            .http
            .put(url)
            .json(&build_upsert_body(document))
            .send()
            .await
            .map_err(|e| VectorIndexError::index(e.to_string()))?;

        Self::check_status(response, VectorIndexError::IndexError).await?;

        debug!(
            document_id = %document.id,
            organisation_id = %document.organisation_id,
            "Upserted document point"
        );
        Ok(())
    }

    async fn search(
        &self,
        organisation_id: Uuid,
        query: &SearchQuery,
    ) -> Result<Vec<DocumentHit>, VectorIndexError> {
        let url = self.endpoint(&format!("collections/{}/points/search", self.config.name))?;

        let response = self
            .http
            .post(url)
            .json(&build_search_body(organisation_id, query))
            .send()
            .await
            .map_err(|e| VectorIndexError::query(e.to_string()))?;

        let response = Self::check_status(response, VectorIndexError::QueryError).await?;

        let body: SearchResponseBody = response
            .json()
            .await
            .map_err(|e| VectorIndexError::parse(e.to_string()))?;

        let mut hits = body
            .result
            .into_iter()
            .map(ScoredPoint::into_hit)
            .collect::<Result<Vec<_>, _>>()?;

        // Qdrant orders by score; re-sort so equal scores order by most
        // recent update, then id, matching the index contract.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(hits)
    }

    async fn delete_document(
        &self,
        organisation_id: Uuid,
        document_id: &str,
    ) -> Result<(), VectorIndexError> {
        let url = self.endpoint(&format!(
            "collections/{}/points/delete?wait=true",
            self.config.name
        ))?;

        let response = self
            .http
            .post(url)
            .json(&build_delete_body(organisation_id, document_id))
            .send()
            .await
            .map_err(|e| VectorIndexError::delete(e.to_string()))?;

        Self::check_status(response, VectorIndexError::DeleteError).await?;
        Ok(())
    }

    /// Create the collection and the partition payload index if they do
    /// not exist yet. Called during application startup.
    async fn ensure_ready(&self) -> Result<(), VectorIndexError> {
        let collection_url = self.endpoint(&format!("collections/{}", self.config.name))?;

        let response = self
            .http
            .get(collection_url.clone())
            .send()
            .await
            .map_err(|e| VectorIndexError::connection(e.to_string()))?;

        if response.status().is_success() {
            debug!(collection = %self.config.name, "Collection already exists");
            return Ok(());
        }

        info!(collection = %self.config.name, "Creating collection");

        let response = self
            .http
            .put(collection_url)
            .json(&collection_settings(&self.config))
            .send()
            .await
            .map_err(|e| VectorIndexError::connection(e.to_string()))?;

        Self::check_status(response, VectorIndexError::ConnectionError).await?;

        let index_url = self.endpoint(&format!("collections/{}/index", self.config.name))?;
        let response = self
            .http
            .put(index_url)
            .json(&organisation_index_settings())
            .send()
            .await
            .map_err(|e| VectorIndexError::connection(e.to_string()))?;

        Self::check_status(response, VectorIndexError::ConnectionError).await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<bool, VectorIndexError> {
        let url = self.endpoint("healthz")?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| VectorIndexError::connection(e.to_string()))?;

        Ok(response.status().is_success())
    }
}
