//! # Connector Search Index
//!
//! This crate provides the multi-tenant vector index: trait definitions for
//! swappable backends, a validating client, a tenant-partitioned in-memory
//! implementation, and a Qdrant REST implementation.
//!
//! Tenant isolation is the core guarantee: every operation is scoped to an
//! organisation partition, and a search can never return another tenant's
//! documents.

pub mod client;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod qdrant;
pub mod types;

pub use client::VectorIndexClient;
pub use config::VectorIndexConfig;
pub use errors::VectorIndexError;
pub use interfaces::VectorIndexProvider;
pub use memory::InMemoryVectorIndex;
pub use qdrant::QdrantVectorIndex;
pub use types::{BatchOperationResult, BatchOperationSummary, SearchMode, SearchQuery};
