use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::{EventError, EventResult};
use super::model::PendingEvent;

/// Durable fallback for events the broker did not take.
///
/// `mark_processed` and `record_failed_attempt` are conditional writes and
/// report whether they changed a row, so concurrent sweeps cannot apply the
/// same transition twice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PendingEventStore: Send + Sync {
    /// Insert when `id` is `None`, otherwise overwrite `retry_count` and
    /// `processed` of the stored row. Returns the event with its id.
    async fn save(&self, event: PendingEvent) -> EventResult<PendingEvent>;

    /// Unprocessed events with fewer than `max_retries` failed attempts
    async fn find_retryable(&self, max_retries: i32) -> EventResult<Vec<PendingEvent>>;

    /// Set `processed` if it is still false
    async fn mark_processed(&self, id: i64) -> EventResult<bool>;

    /// Increment `retry_count` if it still equals `seen_retry_count` and the
    /// event is unprocessed
    async fn record_failed_attempt(&self, id: i64, seen_retry_count: i32) -> EventResult<bool>;

    /// Remove every event created before `cutoff`, processed or not
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> EventResult<u64>;
}

/// In-memory implementation of PendingEventStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryPendingEventStore {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    events: BTreeMap<i64, PendingEvent>,
}

impl InMemoryPendingEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored event ordered by id.
    pub async fn all(&self) -> Vec<PendingEvent> {
        self.state.read().await.events.values().cloned().collect()
    }
}

#[async_trait]
impl PendingEventStore for InMemoryPendingEventStore {
    async fn save(&self, mut event: PendingEvent) -> EventResult<PendingEvent> {
        let mut state = self.state.write().await;

        match event.id {
            None => {
                state.next_id += 1;
                let id = state.next_id;
                event.id = Some(id);
                state.events.insert(id, event.clone());
                Ok(event)
            }
            Some(id) => {
                let stored = state
                    .events
                    .get_mut(&id)
                    .ok_or_else(|| EventError::Storage(format!("Pending event not found: {id}")))?;
                stored.retry_count = event.retry_count;
                stored.processed = event.processed;
                Ok(stored.clone())
            }
        }
    }

    async fn find_retryable(&self, max_retries: i32) -> EventResult<Vec<PendingEvent>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .values()
            .filter(|e| !e.processed && e.retry_count < max_retries)
            .cloned()
            .collect())
    }

    async fn mark_processed(&self, id: i64) -> EventResult<bool> {
        let mut state = self.state.write().await;
        match state.events.get_mut(&id) {
            Some(event) if !event.processed => {
                event.processed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_failed_attempt(&self, id: i64, seen_retry_count: i32) -> EventResult<bool> {
        let mut state = self.state.write().await;
        match state.events.get_mut(&id) {
            Some(event) if !event.processed && event.retry_count == seen_retry_count => {
                event.retry_count += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> EventResult<u64> {
        let mut state = self.state.write().await;
        let before = state.events.len();
        state.events.retain(|_, e| e.created_at >= cutoff);
        Ok((before - state.events.len()) as u64)
    }
}
