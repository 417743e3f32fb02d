//! Supported connector definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of connectors an organisation can install.
///
/// Each variant corresponds to one external data source integration. The
/// enum is deliberately closed: connector-specific payload shapes are keyed
/// by this type, and rate-limiter budgets are registered per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorKind {
    /// Asana project tracker.
    Asana,
    /// Confluence wiki.
    Confluence,
    /// GitHub repositories.
    GitHub,
    /// Gmail mailboxes.
    Gmail,
    /// Google Drive document store.
    GoogleDrive,
    /// Jira issue tracker.
    Jira,
    /// Notion workspaces.
    Notion,
    /// Slack channels.
    Slack,
    /// Generic web crawler.
    WebConnector,
}

impl ConnectorKind {
    /// All supported connectors, in declaration order.
    pub const ALL: [ConnectorKind; 9] = [
        ConnectorKind::Asana,
        ConnectorKind::Confluence,
        ConnectorKind::GitHub,
        ConnectorKind::Gmail,
        ConnectorKind::GoogleDrive,
        ConnectorKind::Jira,
        ConnectorKind::Notion,
        ConnectorKind::Slack,
        ConnectorKind::WebConnector,
    ];

    /// Stable identifier used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::Asana => "asana",
            ConnectorKind::Confluence => "confluence",
            ConnectorKind::GitHub => "github",
            ConnectorKind::Gmail => "gmail",
            ConnectorKind::GoogleDrive => "google-drive",
            ConnectorKind::Jira => "jira",
            ConnectorKind::Notion => "notion",
            ConnectorKind::Slack => "slack",
            ConnectorKind::WebConnector => "web-connector",
        }
    }

    /// Camel-cased name used to build event topic names.
    fn topic_prefix(&self) -> &'static str {
        match self {
            ConnectorKind::Asana => "asana",
            ConnectorKind::Confluence => "confluence",
            ConnectorKind::GitHub => "gitHub",
            ConnectorKind::Gmail => "gmail",
            ConnectorKind::GoogleDrive => "googleDrive",
            ConnectorKind::Jira => "jira",
            ConnectorKind::Notion => "notion",
            ConnectorKind::Slack => "slack",
            ConnectorKind::WebConnector => "webConnector",
        }
    }

    /// Topic on which installation events for this connector are published,
    /// e.g. `"webConnectorInstalled"`.
    pub fn installed_topic(&self) -> String {
        format!("{}Installed", self.topic_prefix())
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectorKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown connector: {}", s))
    }
}
