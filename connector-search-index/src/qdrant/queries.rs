//! Qdrant request builders and response mapping.
//!
//! This module provides functions to build Qdrant point and search bodies
//! and to map scored points back into document hits.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::VectorIndexError;
use crate::types::{SearchMode, SearchQuery};
use connector_search_shared::{ConnectorKind, DocumentHit, IndexedDocument};

/// Deterministic Qdrant point id for a document within its partition.
///
/// Derived from `(organisation_id, document_id)` so re-ingestion of the
/// same document always addresses the same point (upsert semantics).
pub fn point_id(organisation_id: Uuid, document_id: &str) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{}/{}", organisation_id, document_id).as_bytes(),
    )
}

/// Build the upsert body for a single document.
///
/// Vectors are stored under their names; everything else rides in the
/// payload, including the `organisation_id` partition key.
pub fn build_upsert_body(document: &IndexedDocument) -> Value {
    json!({
        "points": [
            {
                "id": point_id(document.organisation_id, &document.id),
                "vector": {
                    "title": document.title_vector,
                    "content": document.content_vector
                },
                "payload": {
                    "document_id": document.id,
                    "organisation_id": document.organisation_id,
                    "title": document.title,
                    "source": document.source.as_str(),
                    "content": document.content,
                    "metadata": document.metadata,
                    "updated_at": document.updated_at.to_rfc3339()
                }
            }
        ]
    })
}

/// Build the search body for a partition-scoped nearest-neighbor query.
pub fn build_search_body(organisation_id: Uuid, query: &SearchQuery) -> Value {
    let vector_name = match query.mode {
        SearchMode::Content => "content",
        SearchMode::Title => "title",
    };

    json!({
        "vector": {
            "name": vector_name,
            "vector": query.vector
        },
        "limit": query.limit.unwrap_or(10),
        "with_payload": true,
        "filter": {
            "must": [
                {
                    "key": "organisation_id",
                    "match": { "value": organisation_id }
                }
            ]
        }
    })
}

/// Build the delete body for a single document.
pub fn build_delete_body(organisation_id: Uuid, document_id: &str) -> Value {
    json!({
        "points": [point_id(organisation_id, document_id)]
    })
}

/// A scored point as returned by Qdrant's search endpoint.
#[derive(Debug, Deserialize)]
pub struct ScoredPoint {
    pub score: f32,
    pub payload: PointPayload,
}

/// The payload stored with every point.
#[derive(Debug, Deserialize)]
pub struct PointPayload {
    pub document_id: String,
    pub organisation_id: Uuid,
    pub title: String,
    pub source: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Value,
    pub updated_at: String,
}

impl ScoredPoint {
    /// Map a scored point into a document hit.
    pub fn into_hit(self) -> Result<DocumentHit, VectorIndexError> {
        let source: ConnectorKind = self
            .payload
            .source
            .parse()
            .map_err(VectorIndexError::parse)?;

        let updated_at = DateTime::parse_from_rfc3339(&self.payload.updated_at)
            .map_err(|e| VectorIndexError::parse(format!("invalid updated_at: {}", e)))?
            .with_timezone(&Utc);

        Ok(DocumentHit {
            id: self.payload.document_id,
            organisation_id: self.payload.organisation_id,
            title: self.payload.title,
            source,
            content: self.payload.content,
            metadata: self.payload.metadata,
            updated_at,
            score: self.score,
        })
    }
}
