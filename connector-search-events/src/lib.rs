//! # Connector Search Events
//!
//! In-process, named-topic publish/subscribe used to decouple installation
//! actions from the ingestion work they cause.
//!
//! ## Delivery contract
//!
//! - `publish` is fire-and-forget: it never blocks on subscriber completion
//!   and never propagates subscriber failures back to the publisher.
//! - Each subscriber owns a dedicated channel drained by its own task, so
//!   delivery to one subscriber preserves publish order (FIFO per
//!   subscriber) while ordering across subscribers is unspecified.
//! - A handler that returns an error is logged and keeps receiving; it
//!   never affects other subscribers.
//! - Events are not persisted. Only subscribers registered at publish time
//!   receive the event.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use connector_search_shared::AppInstalledEvent;

/// Result type returned by subscriber handlers.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// The closed set of payloads carried over the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A connector link was installed or updated for an organisation.
    AppInstalled(AppInstalledEvent),
}

/// An immutable event dispatched to all current subscribers of its topic.
#[derive(Debug, Clone)]
pub struct Event {
    /// The topic the event was published on.
    pub topic: String,
    /// The event payload.
    pub payload: EventPayload,
    /// When the event was published.
    pub published_at: DateTime<Utc>,
}

/// Asynchronous named-topic publish/subscribe bus.
///
/// Thread-safe and cheap to share behind an `Arc`. Publishing takes a short
/// read lock and pushes onto unbounded subscriber channels; it never
/// suspends.
pub struct EventBus {
    topics: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<Arc<Event>>>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Register a handler for every subsequent publish on `topic`.
    ///
    /// The handler runs on its own task; the returned [`JoinHandle`] can be
    /// aborted to unsubscribe. Handler errors are logged and do not stop
    /// the subscription.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> JoinHandle<()>
    where
        F: Fn(Arc<Event>) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Arc<Event>>();

        {
            let mut topics = self.topics.write().expect("event bus lock poisoned");
            topics.entry(topic.to_string()).or_default().push(tx);
        }

        let topic_name = topic.to_string();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = handler(event.clone()).await {
                    error!(
                        topic = %topic_name,
                        error = %e,
                        "Subscriber handler failed"
                    );
                }
            }
        })
    }

    /// Publish an event on `topic` to all current subscribers.
    ///
    /// Publishing to a topic with no subscribers is a no-op. Subscribers
    /// whose task has gone away are pruned.
    pub fn publish(&self, topic: &str, payload: EventPayload) {
        let event = Arc::new(Event {
            topic: topic.to_string(),
            payload,
            published_at: Utc::now(),
        });

        let mut topics = self.topics.write().expect("event bus lock poisoned");
        let Some(subscribers) = topics.get_mut(topic) else {
            debug!(topic = %topic, "Published event with no subscribers");
            return;
        };

        subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        debug!(
            topic = %topic,
            subscribers = subscribers.len(),
            "Published event"
        );
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .expect("event bus lock poisoned")
            .get(topic)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connector_search_shared::ConnectorKind;
    use futures::FutureExt;
    use std::time::Duration;
    use tokio::time::timeout;
    use uuid::Uuid;

    fn test_event(link_id: &str) -> EventPayload {
        EventPayload::AppInstalled(AppInstalledEvent {
            organisation_id: Uuid::new_v4(),
            connector: ConnectorKind::WebConnector,
            link_id: link_id.to_string(),
            link_location: "https://example.com".to_string(),
        })
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish("webConnectorInstalled", test_event("L1"));
        assert_eq!(bus.subscriber_count("webConnectorInstalled"), 0);
    }

    #[tokio::test]
    async fn test_delivery_to_subscriber() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        bus.subscribe("webConnectorInstalled", move |event| {
            let tx = tx.clone();
            async move {
                tx.send(event.topic.clone()).unwrap();
                Ok(())
            }
            .boxed()
        });

        bus.publish("webConnectorInstalled", test_event("L1"));

        let topic = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(topic, "webConnectorInstalled");
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_healthy_one() {
        let bus = EventBus::new();

        bus.subscribe("webConnectorInstalled", |_event| {
            async move { Err("handler failure".into()) }.boxed()
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.subscribe("webConnectorInstalled", move |event| {
            let tx = tx.clone();
            async move {
                let EventPayload::AppInstalled(payload) = &event.payload;
                tx.send(payload.link_id.clone()).unwrap();
                Ok(())
            }
            .boxed()
        });

        bus.publish("webConnectorInstalled", test_event("L1"));

        let link_id = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(link_id, "L1");
    }

    #[tokio::test]
    async fn test_per_subscriber_fifo_order() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        bus.subscribe("webConnectorInstalled", move |event| {
            let tx = tx.clone();
            async move {
                let EventPayload::AppInstalled(payload) = &event.payload;
                tx.send(payload.link_id.clone()).unwrap();
                Ok(())
            }
            .boxed()
        });

        for i in 0..5 {
            bus.publish("webConnectorInstalled", test_event(&format!("L{}", i)));
        }

        for i in 0..5 {
            let link_id = timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(link_id, format!("L{}", i));
        }
    }

    #[tokio::test]
    async fn test_topics_are_independent() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        bus.subscribe("slackInstalled", move |event| {
            let tx = tx.clone();
            async move {
                tx.send(event.topic.clone()).unwrap();
                Ok(())
            }
            .boxed()
        });

        bus.publish("webConnectorInstalled", test_event("L1"));

        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }
}
