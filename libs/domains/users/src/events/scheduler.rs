use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::error::EventResult;
use super::sweeper::RecoverySweeper;

/// Runs the sweeper's redelivery on a fixed interval and its purge on a cron
/// schedule (UTC).
pub struct RecoveryScheduler {
    scheduler: JobScheduler,
}

impl RecoveryScheduler {
    /// Register both jobs and start the scheduler.
    pub async fn start(sweeper: Arc<RecoverySweeper>) -> EventResult<Self> {
        let config = sweeper.config().clone();
        let scheduler = JobScheduler::new().await?;

        let redeliver = Arc::clone(&sweeper);
        let sweep_job = Job::new_repeated_async(config.sweep_interval, move |_uuid, _l| {
            let sweeper = Arc::clone(&redeliver);
            Box::pin(async move {
                sweeper.redeliver().await;
            })
        })?;

        let purge = Arc::clone(&sweeper);
        let purge_job = Job::new_async(config.purge_cron.as_str(), move |_uuid, _l| {
            let sweeper = Arc::clone(&purge);
            Box::pin(async move {
                if let Err(e) = sweeper.purge().await {
                    error!(error = %e, "Scheduled purge of pending events failed");
                }
            })
        })?;

        scheduler.add(sweep_job).await?;
        scheduler.add(purge_job).await?;
        scheduler.start().await?;

        info!(
            sweep_interval_secs = config.sweep_interval.as_secs(),
            purge_cron = %config.purge_cron,
            max_retries = config.max_retries,
            "Pending event recovery scheduled"
        );

        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) -> EventResult<()> {
        self.scheduler.shutdown().await?;
        info!("Pending event recovery stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::config::RecoveryConfig;
    use crate::events::error::EventError;
    use crate::events::publisher::InMemoryEventPublisher;
    use crate::events::store::InMemoryPendingEventStore;

    fn sweeper(config: RecoveryConfig) -> Arc<RecoverySweeper> {
        Arc::new(RecoverySweeper::new(
            Arc::new(InMemoryEventPublisher::new()),
            Arc::new(InMemoryPendingEventStore::new()),
            config,
        ))
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let scheduler = RecoveryScheduler::start(sweeper(RecoveryConfig::default()))
            .await
            .unwrap();
        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_cron_is_rejected() {
        let config = RecoveryConfig {
            purge_cron: "every night".to_string(),
            ..RecoveryConfig::default()
        };

        let result = RecoveryScheduler::start(sweeper(config)).await;
        assert!(matches!(result, Err(EventError::Scheduler(_))));
    }
}
