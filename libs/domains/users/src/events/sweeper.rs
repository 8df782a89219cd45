//! Redelivery and cleanup of pending events.
//!
//! The sweeper publishes directly, bypassing the circuit guard: a parked
//! event is retried on every sweep until it is delivered or has failed
//! `max_retries` times. Exhausted events stay unprocessed and are removed by
//! the retention purge. An acknowledgement that does not arrive within
//! `delivery_timeout` counts as a failed attempt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use event_stream::StreamError;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::config::RecoveryConfig;
use super::error::EventResult;
use super::model::PendingEvent;
use super::publisher::EventPublisher;
use super::store::PendingEventStore;

/// Outcome of one redelivery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Events another sweep settled first, or without an id
    pub skipped: usize,
}

pub struct RecoverySweeper {
    publisher: Arc<dyn EventPublisher>,
    store: Arc<dyn PendingEventStore>,
    config: RecoveryConfig,
    running: Mutex<()>,
}

impl RecoverySweeper {
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        store: Arc<dyn PendingEventStore>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            publisher,
            store,
            config,
            running: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Try every retryable event once.
    ///
    /// Returns an empty report when a sweep is already running in this process.
    pub async fn redeliver(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let Ok(_running) = self.running.try_lock() else {
            debug!("Redelivery already in progress, skipping");
            return report;
        };

        let events = match self.store.find_retryable(self.config.max_retries).await {
            Ok(events) => events,
            Err(e) => {
                error!(error = %e, "Failed to load pending events");
                return report;
            }
        };

        for event in events {
            let Some(id) = event.id else {
                report.skipped += 1;
                continue;
            };
            report.attempted += 1;

            match self.deliver(&event).await {
                Ok(stream_id) => match self.store.mark_processed(id).await {
                    Ok(true) => {
                        report.delivered += 1;
                        info!(event_id = id, email = %event.email, %stream_id, "Pending event redelivered");
                    }
                    Ok(false) => report.skipped += 1,
                    Err(e) => {
                        report.failed += 1;
                        error!(event_id = id, error = %e, "Redelivered event could not be marked processed");
                    }
                },
                Err(e) => {
                    report.failed += 1;
                    self.record_failure(id, &event, &e).await;
                }
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                delivered = report.delivered,
                failed = report.failed,
                skipped = report.skipped,
                "Redelivery sweep finished"
            );
        }
        report
    }

    async fn deliver(&self, event: &PendingEvent) -> Result<String, StreamError> {
        let delivery = self.publisher.publish(&event.to_event())?;
        let limit = self.config.delivery_timeout;

        tokio::time::timeout(limit, delivery.outcome())
            .await
            .unwrap_or(Err(StreamError::Timeout(limit)))
    }

    async fn record_failure(&self, id: i64, event: &PendingEvent, cause: &StreamError) {
        let retry_count = event.retry_count + 1;

        match self.store.record_failed_attempt(id, event.retry_count).await {
            Ok(true) if retry_count >= self.config.max_retries => warn!(
                event_id = id,
                email = %event.email,
                retry_count,
                error = %cause,
                "Pending event reached the retry ceiling and will not be redelivered"
            ),
            Ok(true) => warn!(event_id = id, email = %event.email, retry_count, error = %cause, "Redelivery failed"),
            Ok(false) => debug!(event_id = id, "Pending event changed during sweep"),
            Err(e) => error!(event_id = id, error = %e, "Failed to record redelivery attempt"),
        }
    }

    /// Delete events older than the retention window, processed or not.
    pub async fn purge(&self) -> EventResult<u64> {
        self.purge_at(Utc::now()).await
    }

    pub async fn purge_at(&self, now: DateTime<Utc>) -> EventResult<u64> {
        let cutoff = now - self.config.retention;
        let removed = self.store.delete_older_than(cutoff).await?;
        info!(removed, %cutoff, "Purged old pending events");
        Ok(removed)
    }
}
