//! Error types for the vector index.

mod vector_index_error;

pub use vector_index_error::VectorIndexError;
