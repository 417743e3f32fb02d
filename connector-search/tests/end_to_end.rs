//! End-to-end flow: install a connector, publish a link, let the
//! orchestrator crawl it, and search the organisation's partition.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use connector_search_events::EventBus;
use connector_search_index::{
    InMemoryVectorIndex, SearchQuery, VectorIndexClient, VectorIndexConfig,
};
use connector_search_ingest::{
    connectors::{ConnectorClient, ConnectorSet, CrawlTarget, SourceRecord},
    orchestrator::Orchestrator,
    processor::{DocumentProcessor, Embedder},
    IngestError, RateLimiter,
};
use connector_search_registry::{
    CreateOrganisationInput, InMemoryOrganisationStore, LinkUpsert, OrganisationRegistry,
};
use connector_search_shared::{ConnectorKind, DocumentHit, LinkStatus};

/// Connector returning one record per crawl, versioned so re-crawls are
/// observable.
struct VersionedConnector {
    version: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl ConnectorClient for VersionedConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::WebConnector
    }

    async fn crawl(
        &self,
        _organisation_id: Uuid,
        target: &CrawlTarget,
    ) -> Result<Vec<SourceRecord>, IngestError> {
        let version = self
            .version
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(vec![SourceRecord {
            id: target.link_id.clone(),
            title: "Example".to_string(),
            content: format!("content v{}", version),
            metadata: serde_json::json!({ "location": target.location }),
        }])
    }
}

struct LengthEmbedder;

#[async_trait]
impl Embedder for LengthEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32, 1.0, 0.5])
            .collect())
    }

    fn dimensions(&self) -> usize {
        3
    }
}

struct Harness {
    registry: Arc<OrganisationRegistry>,
    index: Arc<VectorIndexClient>,
    trigger: tokio::sync::broadcast::Sender<()>,
    run: tokio::task::JoinHandle<Result<(), IngestError>>,
}

async fn start() -> Harness {
    let bus = Arc::new(EventBus::new());
    let limiter = Arc::new(RateLimiter::new());
    limiter
        .register(
            ConnectorKind::WebConnector.as_str(),
            5,
            Duration::from_secs(1),
        )
        .unwrap();

    let mut connectors = ConnectorSet::new();
    connectors.register(Arc::new(VersionedConnector {
        version: std::sync::atomic::AtomicUsize::new(1),
    }));

    let index = Arc::new(VectorIndexClient::new(
        Box::new(InMemoryVectorIndex::new()),
        VectorIndexConfig::new(3),
    ));

    let registry = Arc::new(OrganisationRegistry::new(
        Arc::new(InMemoryOrganisationStore::new()),
        bus.clone(),
    ));

    let mut orchestrator = Orchestrator::new(
        Arc::new(connectors),
        limiter,
        Arc::new(DocumentProcessor::new(Arc::new(LengthEmbedder))),
        index.clone(),
        bus,
    );
    let trigger = orchestrator.shutdown_trigger();

    let run = tokio::spawn(async move { orchestrator.run().await });

    // Let the orchestrator subscribe before any event is published.
    tokio::time::sleep(Duration::from_millis(50)).await;

    Harness {
        registry,
        index,
        trigger,
        run,
    }
}

async fn wait_for_hits(
    index: &VectorIndexClient,
    organisation_id: Uuid,
    predicate: impl Fn(&[DocumentHit]) -> bool,
) -> Vec<DocumentHit> {
    for _ in 0..100 {
        let hits = index
            .search_documents(organisation_id, SearchQuery::content(vec![10.0, 1.0, 0.5]))
            .await
            .unwrap();
        if predicate(&hits) {
            return hits;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected documents never reached the index");
}

#[tokio::test]
async fn test_install_publish_crawl_search() {
    let h = start().await;

    let org = h
        .registry
        .create_organisation(CreateOrganisationInput {
            name: "acme".to_string(),
        })
        .await
        .unwrap();
    h.registry
        .install_app(org.id, ConnectorKind::WebConnector)
        .await
        .unwrap();

    // Publishing the link triggers the crawl.
    h.registry
        .upsert_link(
            org.id,
            ConnectorKind::WebConnector,
            LinkUpsert::new("L1")
                .with_location("https://x")
                .with_status(LinkStatus::Pending),
            true,
        )
        .await
        .unwrap();

    let hits = wait_for_hits(&h.index, org.id, |hits| !hits.is_empty()).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "L1");
    assert_eq!(hits[0].source, ConnectorKind::WebConnector);
    assert_eq!(hits[0].content, "content v1");
    assert_eq!(hits[0].metadata["location"], "https://x");

    // A status-only update keeps the link's location and does not
    // duplicate it.
    h.registry
        .upsert_link(
            org.id,
            ConnectorKind::WebConnector,
            LinkUpsert::new("L1").with_status(LinkStatus::Connected),
            false,
        )
        .await
        .unwrap();

    let apps = h.registry.list_installed_apps(org.id).await.unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].links.len(), 1);
    assert_eq!(apps[0].links[0].status, LinkStatus::Connected);
    assert_eq!(apps[0].links[0].location, "https://x");

    // Another tenant sees nothing.
    let other = h
        .index
        .search_documents(Uuid::new_v4(), SearchQuery::content(vec![10.0, 1.0, 0.5]))
        .await
        .unwrap();
    assert!(other.is_empty());

    let _ = h.trigger.send(());
    h.run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_recrawl_replaces_documents() {
    let h = start().await;

    let org = h
        .registry
        .create_organisation(CreateOrganisationInput {
            name: "acme".to_string(),
        })
        .await
        .unwrap();
    h.registry
        .install_app(org.id, ConnectorKind::WebConnector)
        .await
        .unwrap();

    h.registry
        .upsert_link(
            org.id,
            ConnectorKind::WebConnector,
            LinkUpsert::new("L1").with_location("https://x"),
            true,
        )
        .await
        .unwrap();
    wait_for_hits(&h.index, org.id, |hits| !hits.is_empty()).await;

    // Re-publishing the same link re-crawls it; the document is replaced,
    // not duplicated.
    h.registry
        .upsert_link(
            org.id,
            ConnectorKind::WebConnector,
            LinkUpsert::new("L1").with_status(LinkStatus::Connected),
            true,
        )
        .await
        .unwrap();

    let hits = wait_for_hits(&h.index, org.id, |hits| {
        hits.len() == 1 && hits[0].content == "content v2"
    })
    .await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "L1");

    let _ = h.trigger.send(());
    h.run.await.unwrap().unwrap();
}
