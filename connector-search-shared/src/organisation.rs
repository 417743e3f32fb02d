//! Organisation aggregate: the tenant root and its installed connectors.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connector::ConnectorKind;

/// Lifecycle status of a connector-managed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkStatus {
    /// Created but not yet crawled.
    Pending,
    /// Successfully connected and ingesting.
    Connected,
    /// The last crawl or connection attempt failed.
    Error,
    /// Disabled by an operator; retained but not crawled.
    Disabled,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Connected => "connected",
            LinkStatus::Error => "error",
            LinkStatus::Disabled => "disabled",
        };
        f.write_str(s)
    }
}

/// A named resource a connector manages under one installed app, e.g. one
/// monitored folder or channel.
///
/// Identity is `(InstalledApp, id)`. Links are created on first reference
/// from an update payload and updated in place when the same id recurs;
/// they are never implicitly removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Identifier, unique within the owning installed app.
    pub id: String,
    /// Address of the resource in the source system.
    pub location: String,
    /// Human-readable title.
    pub title: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Current lifecycle status.
    pub status: LinkStatus,
}

/// One installed connector, owned by exactly one organisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledApp {
    /// Which connector this installation is for.
    pub connector: ConnectorKind,
    /// Opaque token issued by the connector's OAuth/API flow. Absent until
    /// the authorization flow completes.
    pub installation_id: Option<String>,
    /// Permission scopes granted to the installation.
    pub permissions: Vec<String>,
    /// Connector-managed link resources, in creation order.
    pub links: Vec<Link>,
}

impl InstalledApp {
    /// Create a fresh installation with no links and no installation id.
    pub fn new(connector: ConnectorKind) -> Self {
        Self {
            connector,
            installation_id: None,
            permissions: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Find a link by id.
    pub fn link(&self, link_id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == link_id)
    }

    /// Find a link by id, mutably.
    pub fn link_mut(&mut self, link_id: &str) -> Option<&mut Link> {
        self.links.iter_mut().find(|l| l.id == link_id)
    }
}

/// The tenant root: an organisation and the connectors it has installed.
///
/// Invariant: `installed_apps` contains at most one entry per connector
/// kind. The registry enforces this on every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organisation {
    /// Unique organisation id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Installed connectors, in installation order.
    pub installed_apps: Vec<InstalledApp>,
}

impl Organisation {
    /// Create a new organisation with no installed connectors.
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            installed_apps: Vec::new(),
        }
    }

    /// Whether the given connector is installed.
    pub fn has_app(&self, connector: ConnectorKind) -> bool {
        self.installed_apps.iter().any(|a| a.connector == connector)
    }

    /// Find an installed app by connector kind.
    pub fn installed_app(&self, connector: ConnectorKind) -> Option<&InstalledApp> {
        self.installed_apps.iter().find(|a| a.connector == connector)
    }

    /// Find an installed app by connector kind, mutably.
    pub fn installed_app_mut(&mut self, connector: ConnectorKind) -> Option<&mut InstalledApp> {
        self.installed_apps
            .iter_mut()
            .find(|a| a.connector == connector)
    }
}
