//! Interface definitions for the vector index.
//!
//! This module defines the abstract `VectorIndexProvider` trait that allows
//! for dependency injection and swappable index backend implementations.

mod vector_index_provider;

pub use vector_index_provider::VectorIndexProvider;
