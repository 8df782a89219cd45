use std::sync::Arc;

use event_stream::{CircuitGuard, GuardError, StreamError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::model::{PendingEvent, UserEvent};
use super::publisher::EventPublisher;
use super::store::PendingEventStore;

/// Publishes user events through the circuit guard and parks whatever the
/// broker does not take in the pending store.
///
/// Announcing never fails from the caller's point of view.
pub struct UserEventDispatcher {
    publisher: Arc<dyn EventPublisher>,
    store: Arc<dyn PendingEventStore>,
    guard: Arc<CircuitGuard>,
}

impl UserEventDispatcher {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        store: Arc<dyn PendingEventStore>,
        guard: Arc<CircuitGuard>,
    ) -> Self {
        Self {
            publisher,
            store,
            guard,
        }
    }

    pub fn guard(&self) -> &CircuitGuard {
        &self.guard
    }

    /// Publish `event`, falling back to the pending store.
    ///
    /// A synchronous failure (or an open circuit) parks the event before this
    /// returns. Otherwise the acknowledgement is followed on a background task,
    /// whose handle is returned; an asynchronous failure parks the event there
    /// without counting against the circuit.
    pub async fn announce(&self, event: UserEvent) -> Option<JoinHandle<()>> {
        let publisher = &self.publisher;
        let store = &self.store;
        let event_ref = &event;

        let delivery = self
            .guard
            .call(
                || {
                    let result = publisher.publish(event_ref);
                    async move { result.map(Some) }
                },
                |err: GuardError<StreamError>| async move {
                    match &err {
                        GuardError::Open(circuit) => {
                            warn!(%circuit, title = %event_ref.title, email = %event_ref.email, "Circuit open, parking event")
                        }
                        GuardError::Failed(e) => {
                            warn!(title = %event_ref.title, email = %event_ref.email, error = %e, "Publish failed, parking event")
                        }
                    }
                    park(store.as_ref(), event_ref).await;
                    None
                },
            )
            .await?;

        let store = Arc::clone(&self.store);
        Some(tokio::spawn(async move {
            match delivery.outcome().await {
                Ok(stream_id) => {
                    debug!(title = %event.title, email = %event.email, %stream_id, "Event delivered")
                }
                Err(e) => {
                    error!(title = %event.title, email = %event.email, error = %e, "Event delivery failed, parking event");
                    park(store.as_ref(), &event).await;
                }
            }
        }))
    }
}

/// Save `event` for redelivery. A failed save is logged and the event is lost.
async fn park(store: &dyn PendingEventStore, event: &UserEvent) {
    match store.save(PendingEvent::new(event)).await {
        Ok(saved) => info!(
            event_id = ?saved.id,
            title = %saved.title,
            email = %saved.email,
            "Event stored for redelivery"
        ),
        Err(e) => error!(
            title = %event.title,
            email = %event.email,
            error = %e,
            "Failed to store pending event, event dropped"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::error::EventError;
    use crate::events::publisher::{InMemoryEventPublisher, FailureMode, MockEventPublisher};
    use crate::events::store::{InMemoryPendingEventStore, MockPendingEventStore};
    use event_stream::{CircuitBreakerConfig, CircuitState, Delivery, RetryPolicy};
    use std::time::Duration;

    fn guard(threshold: u32) -> Arc<CircuitGuard> {
        Arc::new(CircuitGuard::new(
            "user-events",
            CircuitBreakerConfig::new()
                .with_failure_threshold(threshold)
                .with_cooldown(Duration::from_secs(30))
                .with_retry(RetryPolicy::none()),
        ))
    }

    #[tokio::test]
    async fn test_successful_publish_stores_nothing() {
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let store = Arc::new(InMemoryPendingEventStore::new());
        let dispatcher = UserEventDispatcher::new(publisher.clone(), store.clone(), guard(5));

        let handle = dispatcher.announce(UserEvent::created("ada@example.com")).await;
        handle.expect("delivery is tracked").await.unwrap();

        assert_eq!(publisher.published().len(), 1);
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_sync_failure_parks_event() {
        let publisher = Arc::new(InMemoryEventPublisher::new());
        publisher.set_failure_mode(FailureMode::Sync);
        let store = Arc::new(InMemoryPendingEventStore::new());
        let dispatcher = UserEventDispatcher::new(publisher, store.clone(), guard(5));

        let handle = dispatcher.announce(UserEvent::deleted("ada@example.com")).await;
        assert!(handle.is_none());

        let pending = store.all().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "DELETED");
        assert_eq!(pending[0].retry_count, 0);
        assert!(!pending[0].processed);
        assert_eq!(dispatcher.guard().failure_count(), 1);
    }

    #[tokio::test]
    async fn test_async_failure_parks_event_without_tripping_circuit() {
        let publisher = Arc::new(InMemoryEventPublisher::new());
        publisher.set_failure_mode(FailureMode::Async);
        let store = Arc::new(InMemoryPendingEventStore::new());
        let dispatcher = UserEventDispatcher::new(publisher, store.clone(), guard(1));

        let handle = dispatcher.announce(UserEvent::created("ada@example.com")).await;
        handle.expect("delivery is tracked").await.unwrap();

        assert_eq!(store.all().await.len(), 1);
        assert_eq!(dispatcher.guard().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_open_circuit_skips_publisher() {
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .times(2)
            .returning(|_| Err(StreamError::Dispatch("down".to_string())));
        let store = Arc::new(InMemoryPendingEventStore::new());
        let dispatcher = UserEventDispatcher::new(Arc::new(publisher), store.clone(), guard(2));

        for i in 0..4 {
            dispatcher
                .announce(UserEvent::created(format!("user{i}@example.com")))
                .await;
        }

        assert_eq!(dispatcher.guard().state(), CircuitState::Open);
        assert_eq!(store.all().await.len(), 4);
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .returning(|_| Err(StreamError::Dispatch("down".to_string())));
        let mut store = MockPendingEventStore::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(EventError::Storage("database unavailable".to_string())));
        let dispatcher = UserEventDispatcher::new(Arc::new(publisher), Arc::new(store), guard(5));

        assert!(dispatcher.announce(UserEvent::created("ada@example.com")).await.is_none());
    }

    #[tokio::test]
    async fn test_delivery_outcome_is_followed_in_background() {
        let (tx, delivery) = Delivery::channel();
        let delivery = std::sync::Mutex::new(Some(delivery));
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .returning(move |_| Ok(delivery.lock().unwrap().take().unwrap()));
        let store = Arc::new(InMemoryPendingEventStore::new());
        let dispatcher = UserEventDispatcher::new(Arc::new(publisher), store.clone(), guard(5));

        let handle = dispatcher
            .announce(UserEvent::created("ada@example.com"))
            .await
            .unwrap();
        assert!(store.all().await.is_empty());

        tx.send(Err(StreamError::Dispatch("timed out".to_string()))).unwrap();
        handle.await.unwrap();

        assert_eq!(store.all().await.len(), 1);
    }
}
