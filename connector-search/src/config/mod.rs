//! Configuration for the connector search service.

mod dependencies;

pub use dependencies::Dependencies;
