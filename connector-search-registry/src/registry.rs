//! Organisation registry implementation.
//!
//! All mutations run as a load → stage → commit cycle under a
//! per-organisation lock, so two concurrent mutations on the same
//! organisation never lose each other's writes, while different
//! organisations never contend.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::RegistryError;
use crate::store::OrganisationStore;
use crate::types::{CreateOrganisationInput, InstalledAppUpdate, LinkUpsert};
use connector_search_events::{EventBus, EventPayload};
use connector_search_shared::{
    AppInstalledEvent, ConnectorKind, InstalledApp, Link, LinkStatus, Organisation,
};

/// Organisation-scoped registry of installed connectors and their links.
pub struct OrganisationRegistry {
    store: Arc<dyn OrganisationStore>,
    bus: Arc<EventBus>,
    available_connectors: HashSet<ConnectorKind>,
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
    op_timeout: Option<Duration>,
}

impl OrganisationRegistry {
    /// Create a registry over the given store and event bus, with every
    /// supported connector available for installation.
    pub fn new(store: Arc<dyn OrganisationStore>, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            bus,
            available_connectors: ConnectorKind::ALL.into_iter().collect(),
            locks: Mutex::new(HashMap::new()),
            op_timeout: None,
        }
    }

    /// Restrict the set of connectors available for installation.
    pub fn with_available_connectors(
        mut self,
        connectors: impl IntoIterator<Item = ConnectorKind>,
    ) -> Self {
        self.available_connectors = connectors.into_iter().collect();
        self
    }

    /// Apply a deadline to every registry operation.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = Some(timeout);
        self
    }

    /// The lock serializing mutations to one organisation.
    fn org_lock(&self, organisation_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("registry lock poisoned");
        locks
            .entry(organisation_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Apply the configured operation deadline.
    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, RegistryError>>,
    {
        match self.op_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut)
                .await
                .map_err(|_| RegistryError::DeadlineExceeded)?,
            None => fut.await,
        }
    }

    async fn load_required(&self, organisation_id: Uuid) -> Result<Organisation, RegistryError> {
        self.store
            .load(organisation_id)
            .await?
            .ok_or_else(|| {
                RegistryError::not_found(format!("organisation {} was not found", organisation_id))
            })
    }

    /// Create a new organisation with no installed connectors.
    pub async fn create_organisation(
        &self,
        input: CreateOrganisationInput,
    ) -> Result<Organisation, RegistryError> {
        if input.name.trim().is_empty() {
            return Err(RegistryError::validation("organisation name is required"));
        }

        let organisation = Organisation::new(Uuid::new_v4(), input.name);
        self.with_deadline(self.store.commit(organisation.clone()))
            .await?;

        info!(organisation_id = %organisation.id, name = %organisation.name, "Created organisation");
        Ok(organisation)
    }

    /// Retrieve an organisation by id.
    pub async fn retrieve(&self, organisation_id: Uuid) -> Result<Organisation, RegistryError> {
        self.with_deadline(self.load_required(organisation_id)).await
    }

    /// List all organisations.
    pub async fn list(&self) -> Result<Vec<Organisation>, RegistryError> {
        self.with_deadline(self.store.list()).await
    }

    /// Install a connector for an organisation.
    ///
    /// Fails with `NotFound` when the organisation or the connector
    /// definition does not exist, and with `AlreadyInstalled` when the
    /// connector is already present. The new installation starts with an
    /// empty link set and no installation id.
    pub async fn install_app(
        &self,
        organisation_id: Uuid,
        connector: ConnectorKind,
    ) -> Result<Organisation, RegistryError> {
        if !self.available_connectors.contains(&connector) {
            return Err(RegistryError::not_found(format!(
                "connector {} is not available for installation",
                connector
            )));
        }

        let lock = self.org_lock(organisation_id);
        self.with_deadline(async {
            let _guard = lock.lock().await;

            let mut organisation = self.load_required(organisation_id).await?;
            if organisation.has_app(connector) {
                return Err(RegistryError::AlreadyInstalled(connector));
            }

            organisation.installed_apps.push(InstalledApp::new(connector));
            self.store.commit(organisation.clone()).await?;

            info!(
                organisation_id = %organisation_id,
                connector = %connector,
                "Installed connector"
            );
            Ok(organisation)
        })
        .await
    }

    /// List an organisation's installed apps.
    ///
    /// An organisation with nothing installed yields an empty list;
    /// `NotFound` is reserved for a missing organisation.
    pub async fn list_installed_apps(
        &self,
        organisation_id: Uuid,
    ) -> Result<Vec<InstalledApp>, RegistryError> {
        let organisation = self.with_deadline(self.load_required(organisation_id)).await?;
        Ok(organisation.installed_apps)
    }

    /// Merge a link update into an installed app's link sequence.
    ///
    /// Matching is by link id: an existing link takes only the supplied
    /// fields (absent fields are preserved), an unknown id appends a new
    /// link, which requires a location. Fails with `NotFound` when the
    /// connector is not installed for the organisation.
    ///
    /// With `emit_event`, publishes the connector's installation event
    /// after the commit so the ingestion pipeline picks up the link.
    pub async fn upsert_link(
        &self,
        organisation_id: Uuid,
        connector: ConnectorKind,
        upsert: LinkUpsert,
        emit_event: bool,
    ) -> Result<Vec<Link>, RegistryError> {
        if upsert.id.trim().is_empty() {
            return Err(RegistryError::validation("link id is required"));
        }

        let lock = self.org_lock(organisation_id);
        let (links, link_location) = self
            .with_deadline(async {
                let _guard = lock.lock().await;

                let mut organisation = self.load_required(organisation_id).await?;
                let (links, link_location) = {
                    let app = organisation.installed_app_mut(connector).ok_or_else(|| {
                        RegistryError::not_found(format!(
                            "connector {} is not installed for organisation {}",
                            connector, organisation_id
                        ))
                    })?;

                    match app.link_mut(&upsert.id) {
                        Some(link) => {
                            if let Some(location) = upsert.location.clone() {
                                link.location = location;
                            }
                            if let Some(title) = upsert.title.clone() {
                                link.title = Some(title);
                            }
                            if let Some(description) = upsert.description.clone() {
                                link.description = Some(description);
                            }
                            if let Some(status) = upsert.status {
                                link.status = status;
                            }
                        }
                        None => {
                            let location = upsert.location.clone().ok_or_else(|| {
                                RegistryError::validation(format!(
                                    "location is required to create link {}",
                                    upsert.id
                                ))
                            })?;
                            app.links.push(Link {
                                id: upsert.id.clone(),
                                location,
                                title: upsert.title.clone(),
                                description: upsert
                                    .description
                                    .clone()
                                    .or_else(|| upsert.title.clone()),
                                status: upsert.status.unwrap_or(LinkStatus::Pending),
                            });
                        }
                    }

                    let link_location = app
                        .link(&upsert.id)
                        .map(|l| l.location.clone())
                        .unwrap_or_default();
                    (app.links.clone(), link_location)
                };

                self.store.commit(organisation).await?;

                debug!(
                    organisation_id = %organisation_id,
                    connector = %connector,
                    link_id = %upsert.id,
                    "Upserted link"
                );
                Ok((links, link_location))
            })
            .await?;

        if emit_event {
            let event = AppInstalledEvent {
                organisation_id,
                connector,
                link_id: upsert.id,
                link_location,
            };
            self.bus.publish(&event.topic(), EventPayload::AppInstalled(event));
        }

        Ok(links)
    }

    /// Replace installation ids and permissions on matching installed apps.
    ///
    /// Every update is validated before anything is applied: an update
    /// naming a connector the organisation does not have installed fails
    /// the whole call with `ValidationError` and leaves the organisation
    /// untouched. A `None` field preserves the stored value.
    pub async fn update_installed_apps(
        &self,
        organisation_id: Uuid,
        updates: Vec<InstalledAppUpdate>,
    ) -> Result<Organisation, RegistryError> {
        let lock = self.org_lock(organisation_id);
        self.with_deadline(async {
            let _guard = lock.lock().await;

            let mut organisation = self.load_required(organisation_id).await?;

            for update in &updates {
                if !organisation.has_app(update.connector) {
                    return Err(RegistryError::validation(format!(
                        "update references connector {} which is not installed",
                        update.connector
                    )));
                }
            }

            for update in updates {
                if let Some(app) = organisation.installed_app_mut(update.connector) {
                    if let Some(installation_id) = update.installation_id {
                        app.installation_id = Some(installation_id);
                    }
                    if let Some(permissions) = update.permissions {
                        app.permissions = permissions;
                    }
                }
            }

            self.store.commit(organisation.clone()).await?;

            debug!(organisation_id = %organisation_id, "Updated installed apps");
            Ok(organisation)
        })
        .await
    }
}
