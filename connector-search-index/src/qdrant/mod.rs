//! Qdrant implementation of the vector index provider.
//!
//! This module provides a concrete implementation of `VectorIndexProvider`
//! using Qdrant's REST API as the backend.

mod client;
mod collection;
mod queries;

pub use client::QdrantVectorIndex;
pub use collection::CollectionConfig;
