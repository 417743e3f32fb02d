//! Organisation persistence abstraction.
//!
//! The registry's merge logic works on plain aggregates loaded from and
//! committed to an [`OrganisationStore`]. The relational persistence used
//! in production is an external collaborator; this module defines the seam
//! and an in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::RegistryError;
use connector_search_shared::Organisation;

/// Load/commit access to organisation aggregates.
///
/// `commit` must replace the stored aggregate atomically: a reader never
/// observes a partially applied organisation. Callers are responsible for
/// serializing mutations to one organisation (the registry holds a
/// per-organisation lock around its load → stage → commit cycle).
#[async_trait]
pub trait OrganisationStore: Send + Sync {
    /// Load an organisation by id. `None` when it does not exist.
    async fn load(&self, organisation_id: Uuid) -> Result<Option<Organisation>, RegistryError>;

    /// All stored organisations.
    async fn list(&self) -> Result<Vec<Organisation>, RegistryError>;

    /// Atomically insert or replace an organisation aggregate.
    async fn commit(&self, organisation: Organisation) -> Result<(), RegistryError>;
}

/// In-memory organisation store.
pub struct InMemoryOrganisationStore {
    organisations: RwLock<HashMap<Uuid, Organisation>>,
}

impl InMemoryOrganisationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            organisations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryOrganisationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrganisationStore for InMemoryOrganisationStore {
    async fn load(&self, organisation_id: Uuid) -> Result<Option<Organisation>, RegistryError> {
        Ok(self.organisations.read().await.get(&organisation_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Organisation>, RegistryError> {
        let mut organisations: Vec<Organisation> =
            self.organisations.read().await.values().cloned().collect();
        organisations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(organisations)
    }

    async fn commit(&self, organisation: Organisation) -> Result<(), RegistryError> {
        self.organisations
            .write()
            .await
            .insert(organisation.id, organisation);
        Ok(())
    }
}
