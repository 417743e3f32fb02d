//! # Connector Search
//!
//! Main library for the connector search service.
//!
//! This crate provides the entry point and configuration for running the
//! installation registry and the ingestion pipeline over a shared event
//! bus and vector index.

pub mod config;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingestion pipeline error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] connector_search_ingest::IngestError),

    /// Vector index error.
    #[error("Index error: {0}")]
    IndexError(#[from] connector_search_index::VectorIndexError),

    /// Registry error.
    #[error("Registry error: {0}")]
    RegistryError(#[from] connector_search_registry::RegistryError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ServiceError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
