use event_stream::StreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

pub type EventResult<T> = Result<T, EventError>;

impl From<sea_orm::DbErr> for EventError {
    fn from(err: sea_orm::DbErr) -> Self {
        EventError::Storage(err.to_string())
    }
}

impl From<tokio_cron_scheduler::JobSchedulerError> for EventError {
    fn from(err: tokio_cron_scheduler::JobSchedulerError) -> Self {
        EventError::Scheduler(err.to_string())
    }
}
