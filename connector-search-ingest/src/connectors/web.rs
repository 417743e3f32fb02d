//! Web connector crawl client.
//!
//! Fetches the page a link points at and produces one source record from
//! it. Richer connector protocols (document stores, project trackers) are
//! external collaborators implementing [`ConnectorClient`] the same way.
//!
//! [`ConnectorClient`]: crate::connectors::ConnectorClient

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::connectors::{ConnectorClient, CrawlTarget, SourceRecord};
use crate::errors::IngestError;
use connector_search_shared::ConnectorKind;

/// Crawl client for the web connector.
pub struct WebConnectorClient {
    http: reqwest::Client,
}

impl WebConnectorClient {
    /// Create a web connector client.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Pull the contents of `<title>` out of an HTML page, if present.
    fn extract_title(body: &str) -> Option<String> {
        let lower = body.to_lowercase();
        // Lowercasing must not shift byte offsets for them to index into
        // the original body.
        if lower.len() != body.len() {
            return None;
        }
        let start = lower.find("<title")?;
        let open_end = body[start..].find('>').map(|i| start + i + 1)?;
        let close = lower[open_end..].find("</title>").map(|i| open_end + i)?;
        let title = body[open_end..close].trim();
        if title.is_empty() {
            None
        } else {
            Some(title.to_string())
        }
    }
}

impl Default for WebConnectorClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectorClient for WebConnectorClient {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::WebConnector
    }

    async fn crawl(
        &self,
        organisation_id: Uuid,
        target: &CrawlTarget,
    ) -> Result<Vec<SourceRecord>, IngestError> {
        let response = self
            .http
            .get(&target.location)
            .send()
            .await
            .map_err(|e| IngestError::connector(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::connector(format!(
                "fetch of {} failed with status {}",
                target.location, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IngestError::connector(e.to_string()))?;

        let title = Self::extract_title(&body).unwrap_or_else(|| target.location.clone());

        debug!(
            organisation_id = %organisation_id,
            link_id = %target.link_id,
            location = %target.location,
            bytes = body.len(),
            "Fetched web link"
        );

        Ok(vec![SourceRecord {
            id: target.link_id.clone(),
            title,
            content: body,
            metadata: serde_json::json!({ "location": target.location }),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let body = "<html><head><title>Example Domain</title></head></html>";
        assert_eq!(
            WebConnectorClient::extract_title(body).as_deref(),
            Some("Example Domain")
        );
    }

    #[test]
    fn test_extract_title_missing() {
        assert!(WebConnectorClient::extract_title("<html></html>").is_none());
        assert!(WebConnectorClient::extract_title("<html><title></title></html>").is_none());
    }

    #[test]
    fn test_extract_title_with_attributes() {
        let body = r#"<title lang="en">Docs</title>"#;
        assert_eq!(
            WebConnectorClient::extract_title(body).as_deref(),
            Some("Docs")
        );
    }
}
