//! Dependency initialization and wiring for the connector search service.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::ServiceError;
use connector_search_events::EventBus;
use connector_search_index::{
    qdrant::CollectionConfig, InMemoryVectorIndex, QdrantVectorIndex, VectorIndexClient,
    VectorIndexConfig, VectorIndexProvider,
};
use connector_search_ingest::{
    connectors::{bootstrap_connectors, ConnectorSpec, RateBudget, WebConnectorClient},
    orchestrator::Orchestrator,
    processor::{DocumentProcessor, HttpEmbedder, HttpEmbedderConfig},
    RateLimiter,
};
use connector_search_registry::{InMemoryOrganisationStore, OrganisationRegistry};

/// Default embedding size (text-embedding-3-small).
const DEFAULT_EMBEDDING_SIZE: usize = 1536;

/// Default embeddings endpoint.
const DEFAULT_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";

/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default Qdrant collection name.
const DEFAULT_QDRANT_COLLECTION: &str = "documents";

/// Default per-connector rate budget: requests per interval.
const DEFAULT_CONNECTOR_RATE_REQUESTS: usize = 5;
const DEFAULT_CONNECTOR_RATE_INTERVAL_MS: u64 = 1000;

/// Default embedding API rate budget: requests per interval.
const DEFAULT_EMBEDDING_RATE_REQUESTS: usize = 60;
const DEFAULT_EMBEDDING_RATE_INTERVAL_MS: u64 = 60_000;

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ServiceError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ServiceError::config(format!("invalid value for {}: {}", name, value))),
        Err(_) => Ok(default),
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// The organisation registry serving installation operations.
    pub registry: Arc<OrganisationRegistry>,
    /// The vector index client serving search queries.
    pub index: Arc<VectorIndexClient>,
    /// The event bus wiring installation actions to ingestion.
    pub bus: Arc<EventBus>,
    /// The process-wide rate limiter.
    pub limiter: Arc<RateLimiter>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QDRANT_URL`: Qdrant server URL; when unset an in-memory index is
    ///   used
    /// - `QDRANT_COLLECTION`: collection name (default: documents)
    /// - `EMBEDDING_SIZE`: embedding size (default: 1536)
    /// - `EMBEDDING_API_URL` / `EMBEDDING_MODEL` / `EMBEDDING_API_KEY`:
    ///   embeddings API settings; the key is required
    /// - `EMBEDDING_RATE_REQUESTS` / `EMBEDDING_RATE_INTERVAL_MS`:
    ///   embedding API budget (default: 60 per 60000ms)
    /// - `WEB_CONNECTOR_RATE_REQUESTS` / `WEB_CONNECTOR_RATE_INTERVAL_MS`:
    ///   web connector budget (default: 5 per 1000ms)
    pub async fn new() -> Result<Self, ServiceError> {
        let embedding_size = env_parse("EMBEDDING_SIZE", DEFAULT_EMBEDDING_SIZE)?;

        // Vector index backend: Qdrant when configured, in-memory otherwise.
        let provider: Box<dyn VectorIndexProvider> = match env::var("QDRANT_URL") {
            Ok(url) => {
                let collection = env_or("QDRANT_COLLECTION", DEFAULT_QDRANT_COLLECTION);
                let qdrant = QdrantVectorIndex::new(
                    &url,
                    CollectionConfig::new(collection, embedding_size),
                )
                .map_err(|e| {
                    ServiceError::config(format!("failed to create Qdrant client: {}", e))
                })?;
                info!(url = %url, "Using Qdrant vector index");
                Box::new(qdrant)
            }
            Err(_) => {
                info!("QDRANT_URL not set; using in-memory vector index");
                Box::new(InMemoryVectorIndex::new())
            }
        };

        let index = Arc::new(VectorIndexClient::new(
            provider,
            VectorIndexConfig::new(embedding_size),
        ));

        // Verify the backend is reachable before wiring anything else.
        let healthy = index
            .health_check()
            .await
            .map_err(|e| ServiceError::config(format!("index health check failed: {}", e)))?;
        if !healthy {
            return Err(ServiceError::config("vector index backend is unhealthy"));
        }
        info!("Vector index connection verified");

        let bus = Arc::new(EventBus::new());
        let limiter = Arc::new(RateLimiter::new());

        // Embedder, with its own rate budget.
        let api_key = env::var("EMBEDDING_API_KEY")
            .map_err(|_| ServiceError::config("EMBEDDING_API_KEY must be set"))?;
        let embedder = HttpEmbedder::new(
            HttpEmbedderConfig {
                endpoint: env_or("EMBEDDING_API_URL", DEFAULT_EMBEDDING_API_URL),
                model: env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
                api_key,
                dimensions: embedding_size,
                batch_size: 100,
                rate_budget: Some((
                    env_parse("EMBEDDING_RATE_REQUESTS", DEFAULT_EMBEDDING_RATE_REQUESTS)?,
                    Duration::from_millis(env_parse(
                        "EMBEDDING_RATE_INTERVAL_MS",
                        DEFAULT_EMBEDDING_RATE_INTERVAL_MS,
                    )?),
                )),
            },
            Some(limiter.clone()),
        )
        .map_err(|e| ServiceError::config(format!("failed to create embedder: {}", e)))?;

        let processor = Arc::new(DocumentProcessor::new(Arc::new(embedder)));

        // Connector bootstrap: a connector with bad rate configuration is
        // logged and skipped without failing startup.
        let specs = vec![ConnectorSpec {
            client: Arc::new(WebConnectorClient::new()),
            rate_budget: Some(RateBudget {
                requests: env_parse(
                    "WEB_CONNECTOR_RATE_REQUESTS",
                    DEFAULT_CONNECTOR_RATE_REQUESTS,
                )?,
                interval: Duration::from_millis(env_parse(
                    "WEB_CONNECTOR_RATE_INTERVAL_MS",
                    DEFAULT_CONNECTOR_RATE_INTERVAL_MS,
                )?),
            }),
        }];
        let connectors = Arc::new(bootstrap_connectors(specs, &limiter));
        info!(connector_count = connectors.kinds().len(), "Connectors initialized");

        // Registry over the in-memory store; relational persistence plugs
        // in through the OrganisationStore seam.
        let registry = Arc::new(OrganisationRegistry::new(
            Arc::new(InMemoryOrganisationStore::new()),
            bus.clone(),
        ));

        let orchestrator = Orchestrator::new(
            connectors,
            limiter.clone(),
            processor,
            index.clone(),
            bus.clone(),
        );

        Ok(Self {
            orchestrator,
            registry,
            index,
            bus,
            limiter,
        })
    }
}
