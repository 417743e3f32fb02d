//! Document types stored in and returned from the vector index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connector::ConnectorKind;

/// The unit stored in the vector index.
///
/// `id` is stable across re-ingestion and is the upsert key within an
/// organisation's partition: for a given id at most one logical document
/// exists per organisation, and re-ingestion with the same id replaces the
/// stored vectors and content while preserving identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Stable document identity within the organisation partition.
    pub id: String,
    /// Partition key. A document is only ever visible to this organisation.
    pub organisation_id: Uuid,
    /// Document title.
    pub title: String,
    /// Embedding of the title.
    pub title_vector: Vec<f32>,
    /// Connector the document was ingested from.
    pub source: ConnectorKind,
    /// Document body text.
    pub content: String,
    /// Embedding of the content.
    pub content_vector: Vec<f32>,
    /// Free-form metadata carried through ingestion.
    pub metadata: serde_json::Value,
    /// Last time the document was (re-)ingested.
    pub updated_at: DateTime<Utc>,
}

impl IndexedDocument {
    /// Create a document with empty vectors, to be filled in by the
    /// embedding step of the ingestion pipeline.
    pub fn new(
        id: impl Into<String>,
        organisation_id: Uuid,
        source: ConnectorKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            organisation_id,
            title: title.into(),
            title_vector: Vec::new(),
            source,
            content: content.into(),
            content_vector: Vec::new(),
            metadata: serde_json::Value::Null,
            updated_at: Utc::now(),
        }
    }
}

/// A search result returned from the vector index.
///
/// Embedding vectors are write-only: hits never carry them back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    /// Document identity.
    pub id: String,
    /// Owning organisation.
    pub organisation_id: Uuid,
    /// Document title.
    pub title: String,
    /// Source connector.
    pub source: ConnectorKind,
    /// Document body text.
    pub content: String,
    /// Free-form metadata.
    pub metadata: serde_json::Value,
    /// Last ingestion time.
    pub updated_at: DateTime<Utc>,
    /// Similarity score; higher is closer.
    pub score: f32,
}

impl DocumentHit {
    /// Build a hit from a stored document, dropping its vectors.
    pub fn from_document(doc: &IndexedDocument, score: f32) -> Self {
        Self {
            id: doc.id.clone(),
            organisation_id: doc.organisation_id,
            title: doc.title.clone(),
            source: doc.source,
            content: doc.content.clone(),
            metadata: doc.metadata.clone(),
            updated_at: doc.updated_at,
            score,
        }
    }
}
