//! Input types for registry operations.

use connector_search_shared::{ConnectorKind, LinkStatus};

/// Input for creating a new organisation.
#[derive(Debug, Clone)]
pub struct CreateOrganisationInput {
    /// Display name of the organisation.
    pub name: String,
}

/// Partial update for a link, merged by id into an installed app's link
/// sequence.
///
/// Only fields that are `Some` are applied; fields that are `None` are
/// preserved from the existing link. A link id that does not exist yet
/// appends a new link, which requires a `location`.
#[derive(Debug, Clone)]
pub struct LinkUpsert {
    /// Link identity within the installed app.
    pub id: String,
    /// New address in the source system.
    pub location: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New lifecycle status.
    pub status: Option<LinkStatus>,
}

impl LinkUpsert {
    /// Create an upsert that only carries the link id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: None,
            title: None,
            description: None,
            status: None,
        }
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: LinkStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Partial update for an installed app's credentials and permissions.
///
/// Only fields that are `Some` are replaced; a `None` field preserves the
/// stored value, so a partial update can never null out an installation id
/// or permission set.
#[derive(Debug, Clone)]
pub struct InstalledAppUpdate {
    /// Which installed connector the update addresses.
    pub connector: ConnectorKind,
    /// New installation id issued by the connector's OAuth/API flow.
    pub installation_id: Option<String>,
    /// New permission scopes.
    pub permissions: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_upsert_builder() {
        let upsert = LinkUpsert::new("L1")
            .with_location("https://example.com")
            .with_status(LinkStatus::Pending);

        assert_eq!(upsert.id, "L1");
        assert_eq!(upsert.location.as_deref(), Some("https://example.com"));
        assert_eq!(upsert.status, Some(LinkStatus::Pending));
        assert!(upsert.title.is_none());
        assert!(upsert.description.is_none());
    }
}
