//! # Connector Search Registry
//!
//! This crate provides the organisation aggregate and its operations: which
//! connectors a tenant has installed, the link resources each connector
//! manages, and the merge-on-update semantics for both.
//!
//! Persistence is abstracted behind the [`OrganisationStore`] trait so the
//! merge logic stays pure and independently testable; an in-memory store is
//! included. All mutations to one organisation are applied atomically under
//! a per-organisation lock.

pub mod errors;
pub mod registry;
pub mod store;
pub mod types;

pub use errors::RegistryError;
pub use registry::OrganisationRegistry;
pub use store::{InMemoryOrganisationStore, OrganisationStore};
pub use types::{CreateOrganisationInput, InstalledAppUpdate, LinkUpsert};
