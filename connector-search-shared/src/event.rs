//! Event payloads exchanged over the event bus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::connector::ConnectorKind;

/// Payload published when a connector link is installed or updated for an
/// organisation.
///
/// Published on the connector's `"<connector>Installed"` topic and consumed
/// by the ingestion orchestrator to start a crawl of the link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInstalledEvent {
    /// The organisation the connector was installed for.
    pub organisation_id: Uuid,
    /// The installed connector.
    pub connector: ConnectorKind,
    /// The link that triggered the event.
    pub link_id: String,
    /// Address of the link in the source system.
    pub link_location: String,
}

impl AppInstalledEvent {
    /// The topic this event is published on.
    pub fn topic(&self) -> String {
        self.connector.installed_topic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_matches_connector() {
        let event = AppInstalledEvent {
            organisation_id: Uuid::new_v4(),
            connector: ConnectorKind::WebConnector,
            link_id: "L1".to_string(),
            link_location: "https://example.com".to_string(),
        };
        assert_eq!(event.topic(), "webConnectorInstalled");
    }
}
