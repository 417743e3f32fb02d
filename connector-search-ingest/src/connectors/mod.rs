//! Connector crawl clients and their bootstrap.
//!
//! The per-connector crawl protocols are external collaborators; this
//! module defines the seam they implement ([`ConnectorClient`]), the set
//! the orchestrator resolves clients from, and the bootstrap step that
//! registers each connector's rate budget.

mod web;

pub use web::WebConnectorClient;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::IngestError;
use crate::limiter::RateLimiter;
use connector_search_shared::ConnectorKind;

/// The link a crawl targets, taken from an installation event.
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    /// Link identity within the installed app.
    pub link_id: String,
    /// Address of the resource in the source system.
    pub location: String,
}

/// Raw item produced by a connector crawl before processing.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    /// Stable identity of the item in the source system, used as the
    /// upsert key across re-ingestion.
    pub id: String,
    /// Item title.
    pub title: String,
    /// Item body text.
    pub content: String,
    /// Free-form metadata carried into the index.
    pub metadata: Value,
}

/// A crawl client for one connector.
///
/// Implementations wrap the third-party API of their connector and return
/// the records a link currently exposes. Crawls run under the connector's
/// rate budget; implementations do not acquire slots themselves.
#[async_trait]
pub trait ConnectorClient: Send + Sync {
    /// Which connector this client crawls.
    fn kind(&self) -> ConnectorKind;

    /// Crawl one link and return all records it exposes.
    async fn crawl(
        &self,
        organisation_id: Uuid,
        target: &CrawlTarget,
    ) -> Result<Vec<SourceRecord>, IngestError>;
}

/// The crawl clients available to the orchestrator, one per connector.
pub struct ConnectorSet {
    clients: HashMap<ConnectorKind, Arc<dyn ConnectorClient>>,
}

impl ConnectorSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// Register a client, replacing any previous client for its connector.
    pub fn register(&mut self, client: Arc<dyn ConnectorClient>) {
        self.clients.insert(client.kind(), client);
    }

    /// Resolve the client for a connector.
    pub fn get(&self, kind: ConnectorKind) -> Option<Arc<dyn ConnectorClient>> {
        self.clients.get(&kind).cloned()
    }

    /// The connectors with a registered client.
    pub fn kinds(&self) -> Vec<ConnectorKind> {
        self.clients.keys().copied().collect()
    }

    /// Whether no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ConnectorSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate budget configuration for one connector.
#[derive(Debug, Clone, Copy)]
pub struct RateBudget {
    /// Requests allowed per interval.
    pub requests: usize,
    /// Sliding window length.
    pub interval: Duration,
}

/// Everything needed to bring one connector online.
pub struct ConnectorSpec {
    /// The crawl client.
    pub client: Arc<dyn ConnectorClient>,
    /// The connector's rate budget. Required: a connector without one is
    /// skipped at bootstrap.
    pub rate_budget: Option<RateBudget>,
}

/// Register each connector's client and rate budget.
///
/// A connector with missing or invalid rate-limit configuration fails its
/// own initialization (logged and skipped) without stopping the others, so
/// one misconfigured connector never blocks startup.
pub fn bootstrap_connectors(
    specs: Vec<ConnectorSpec>,
    limiter: &RateLimiter,
) -> ConnectorSet {
    let mut set = ConnectorSet::new();

    for spec in specs {
        let kind = spec.client.kind();

        let Some(budget) = spec.rate_budget else {
            error!(connector = %kind, "No rate limiter configuration provided; skipping connector");
            continue;
        };

        if let Err(e) = limiter.register(kind.as_str(), budget.requests, budget.interval) {
            error!(connector = %kind, error = %e, "Failed to register rate budget; skipping connector");
            continue;
        }

        set.register(spec.client);
        info!(connector = %kind, "Connector initialized");
    }

    set
}
