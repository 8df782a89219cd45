//! Stream error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The write could not be handed to the broker at all
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// The broker did not acknowledge the write in time
    #[error("No acknowledgement within {0:?}")]
    Timeout(Duration),
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}
