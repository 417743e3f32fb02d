//! Qdrant collection configuration.
//!
//! This module defines the collection settings for the document index.

use serde_json::{json, Value};

/// Configuration for the Qdrant collection backing the index.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Collection name.
    pub name: String,
    /// Embedding size for both named vectors.
    pub embedding_size: usize,
}

impl CollectionConfig {
    /// Create a collection config with the given embedding size.
    pub fn new(name: impl Into<String>, embedding_size: usize) -> Self {
        Self {
            name: name.into(),
            embedding_size,
        }
    }
}

/// Collection creation body.
///
/// Each document carries two named vectors (`title` and `content`) scored
/// with cosine distance, plus an indexed `organisation_id` payload field
/// used as the tenant partition filter.
pub fn collection_settings(config: &CollectionConfig) -> Value {
    json!({
        "vectors": {
            "title": {
                "size": config.embedding_size,
                "distance": "Cosine"
            },
            "content": {
                "size": config.embedding_size,
                "distance": "Cosine"
            }
        }
    })
}

/// Payload index creation body for the tenant partition field.
pub fn organisation_index_settings() -> Value {
    json!({
        "field_name": "organisation_id",
        "field_schema": "keyword"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_settings_carry_both_named_vectors() {
        let settings = collection_settings(&CollectionConfig::new("documents", 1536));
        assert_eq!(settings["vectors"]["title"]["size"], 1536);
        assert_eq!(settings["vectors"]["content"]["size"], 1536);
        assert_eq!(settings["vectors"]["content"]["distance"], "Cosine");
    }
}
