//! Orchestrator module for the ingestion pipeline.
//!
//! Subscribes to installation events and coordinates the rate-limited
//! crawl, embedding, and loading of each connector link.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::connectors::{ConnectorSet, CrawlTarget};
use crate::errors::IngestError;
use crate::limiter::RateLimiter;
use crate::loader::{IndexLoader, LoaderConfig};
use crate::processor::DocumentProcessor;
use connector_search_events::{EventBus, EventPayload};
use connector_search_index::VectorIndexClient;
use connector_search_shared::ConnectorKind;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the job channel buffer.
    pub channel_buffer_size: usize,
    /// How long a job may wait for a rate limit slot before failing with
    /// a rate limit timeout.
    pub acquire_timeout: Duration,
    /// Loader batching configuration.
    pub loader: LoaderConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
            acquire_timeout: Duration::from_secs(30),
            loader: LoaderConfig::default(),
        }
    }
}

/// One unit of ingestion work: crawl one link of one connector for one
/// organisation.
#[derive(Debug, Clone)]
pub struct IngestJob {
    /// The organisation the link belongs to.
    pub organisation_id: Uuid,
    /// The connector to crawl with.
    pub connector: ConnectorKind,
    /// The link that triggered the job.
    pub link_id: String,
    /// Address of the link in the source system.
    pub link_location: String,
}

/// Orchestrator that coordinates the ingestion pipeline.
///
/// The orchestrator:
/// - Subscribes to every registered connector's installation topic
/// - Queues one job per installation event
/// - Runs each job on its own worker under the connector's rate budget
/// - Handles shutdown signals
pub struct Orchestrator {
    connectors: Arc<ConnectorSet>,
    limiter: Arc<RateLimiter>,
    processor: Arc<DocumentProcessor>,
    index: Arc<VectorIndexClient>,
    bus: Arc<EventBus>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        connectors: Arc<ConnectorSet>,
        limiter: Arc<RateLimiter>,
        processor: Arc<DocumentProcessor>,
        index: Arc<VectorIndexClient>,
        bus: Arc<EventBus>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            connectors,
            limiter,
            processor,
            index,
            bus,
            config: OrchestratorConfig::default(),
            shutdown_tx,
        }
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        connectors: Arc<ConnectorSet>,
        limiter: Arc<RateLimiter>,
        processor: Arc<DocumentProcessor>,
        index: Arc<VectorIndexClient>,
        bus: Arc<EventBus>,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            connectors,
            limiter,
            processor,
            index,
            bus,
            config,
            shutdown_tx,
        }
    }

    /// Run the orchestrator.
    ///
    /// This method subscribes to installation topics and coordinates job
    /// flow. It blocks until a shutdown signal is received.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), IngestError> {
        info!("Starting ingestion orchestrator");

        // Ensure the index backend is ready before accepting work.
        self.index.ensure_ready().await?;

        let (tx, mut rx) = mpsc::channel::<IngestJob>(self.config.channel_buffer_size);

        // One subscription per registered connector.
        let mut subscriptions = Vec::new();
        for kind in self.connectors.kinds() {
            let topic = kind.installed_topic();
            let tx = tx.clone();

            let handle = self.bus.subscribe(&topic, move |event| {
                let tx = tx.clone();
                Box::pin(async move {
                    let EventPayload::AppInstalled(payload) = &event.payload;
                    let job = IngestJob {
                        organisation_id: payload.organisation_id,
                        connector: payload.connector,
                        link_id: payload.link_id.clone(),
                        link_location: payload.link_location.clone(),
                    };
                    tx.send(job)
                        .await
                        .map_err(|_| "ingest job channel closed".into())
                })
            });

            subscriptions.push(handle);
            info!(topic = %topic, "Subscribed to installation events");
        }
        drop(tx);

        let mut workers = JoinSet::new();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                job = rx.recv() => {
                    match job {
                        Some(job) => {
                            let connectors = self.connectors.clone();
                            let limiter = self.limiter.clone();
                            let processor = self.processor.clone();
                            let index = self.index.clone();
                            let acquire_timeout = self.config.acquire_timeout;
                            let loader_config = self.config.loader.clone();

                            workers.spawn(async move {
                                if let Err(e) = run_job(
                                    connectors,
                                    limiter,
                                    processor,
                                    index,
                                    loader_config,
                                    acquire_timeout,
                                    &job,
                                )
                                .await
                                {
                                    error!(
                                        organisation_id = %job.organisation_id,
                                        connector = %job.connector,
                                        link_id = %job.link_id,
                                        error = %e,
                                        "Ingestion job failed"
                                    );
                                }
                            });
                        }
                        None => {
                            info!("Job stream ended");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Orchestrator received shutdown signal");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
            }
        }

        // Stop accepting events, then drain in-flight workers.
        for handle in subscriptions {
            handle.abort();
        }
        while workers.join_next().await.is_some() {}

        info!("Orchestrator shutdown complete");
        Ok(())
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// A handle that can trigger shutdown after the orchestrator has been
    /// moved into its run task.
    pub fn shutdown_trigger(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }
}

/// Execute one ingestion job under its connector's rate budget.
async fn run_job(
    connectors: Arc<ConnectorSet>,
    limiter: Arc<RateLimiter>,
    processor: Arc<DocumentProcessor>,
    index: Arc<VectorIndexClient>,
    loader_config: LoaderConfig,
    acquire_timeout: Duration,
    job: &IngestJob,
) -> Result<(), IngestError> {
    let client = connectors.get(job.connector).ok_or_else(|| {
        IngestError::connector(format!("no client registered for {}", job.connector))
    })?;

    let budget_name = job.connector.as_str();
    limiter.acquire_timeout(budget_name, acquire_timeout).await?;

    let outcome = async {
        let target = CrawlTarget {
            link_id: job.link_id.clone(),
            location: job.link_location.clone(),
        };

        let records = client.crawl(job.organisation_id, &target).await?;
        info!(
            organisation_id = %job.organisation_id,
            connector = %job.connector,
            link_id = %job.link_id,
            record_count = records.len(),
            "Crawled link"
        );

        let documents = processor
            .process_batch(job.organisation_id, job.connector, records)
            .await?;

        let mut loader = IndexLoader::with_config(index, loader_config);
        loader.load(documents).await?;
        loader.flush().await?;

        Ok(())
    }
    .await;

    // The slot is returned on every path; a failed crawl must not leak
    // budget.
    if let Err(e) = limiter.release(budget_name) {
        warn!(connector = %budget_name, error = %e, "Failed to release rate limit slot");
    }

    outcome
}
