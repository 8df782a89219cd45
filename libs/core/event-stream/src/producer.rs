//! Stream producer for keyed events
//!
//! Publishing is split in two phases. [`StreamProducer::dispatch_keyed`]
//! encodes the payload and hands the `XADD` to a background task; failures in
//! that phase come back as `Err` right away. The broker's answer arrives later
//! through the returned [`Delivery`], which resolves to the stream entry id.
//!
//! # Example
//!
//! ```rust,ignore
//! let producer = StreamProducer::from_stream_def::<UserEventStream>(redis);
//!
//! let delivery = producer.dispatch_keyed("ada@example.com", &event)?;
//! match delivery.outcome().await {
//!     Ok(id) => tracing::info!(%id, "stored"),
//!     Err(e) => tracing::error!(error = %e, "lost"),
//! }
//! ```

use crate::error::StreamError;
use crate::registry::StreamDef;
use redis::aio::ConnectionManager;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, error};

/// Field holding the partition key (the subject's email for user events)
pub const KEY_FIELD: &str = "key";
/// Field holding the JSON payload
pub const EVENT_FIELD: &str = "event";

/// Pending acknowledgement of one stream write.
///
/// Dropping it detaches the write; the background task still completes and
/// logs its result.
#[derive(Debug)]
pub struct Delivery {
    rx: oneshot::Receiver<Result<String, StreamError>>,
}

impl Delivery {
    /// A delivery whose outcome is already known.
    pub fn ready(result: Result<String, StreamError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }

    /// A delivery completed later through `tx`.
    pub fn channel() -> (oneshot::Sender<Result<String, StreamError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Wait for the broker's answer: the stream entry id, or the write error.
    pub async fn outcome(self) -> Result<String, StreamError> {
        self.rx
            .await
            .unwrap_or_else(|_| Err(StreamError::Dispatch("delivery task ended without a result".to_string())))
    }
}

/// Appends keyed JSON entries to one Redis stream.
#[derive(Clone)]
pub struct StreamProducer {
    redis: ConnectionManager,
    stream_name: String,
    max_length: i64,
}

impl StreamProducer {
    /// Create a producer from a `StreamDef` implementation.
    pub fn from_stream_def<S: StreamDef>(redis: ConnectionManager) -> Self {
        Self {
            redis,
            stream_name: S::STREAM_NAME.to_string(),
            max_length: S::MAX_LENGTH,
        }
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Encode `payload` and start an `XADD <stream> MAXLEN ~ <n> * key <key> event <json>`.
    ///
    /// Returns without waiting for Redis. Must be called inside a Tokio runtime.
    pub fn dispatch_keyed<T: Serialize>(&self, key: &str, payload: &T) -> Result<Delivery, StreamError> {
        let body = serde_json::to_string(payload)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StreamError::Dispatch(e.to_string()))?;

        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg(KEY_FIELD)
            .arg(key)
            .arg(EVENT_FIELD)
            .arg(&body);

        let mut conn = self.redis.clone();
        let stream = self.stream_name.clone();
        let key = key.to_string();
        let (tx, delivery) = Delivery::channel();

        runtime.spawn(async move {
            let result: Result<String, StreamError> =
                cmd.query_async(&mut conn).await.map_err(StreamError::from);

            match &result {
                Ok(stream_id) => debug!(%stream, %key, %stream_id, "Stream entry appended"),
                Err(e) => error!(%stream, %key, error = %e, "Stream append failed"),
            }

            let _ = tx.send(result);
        });

        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_delivery_yields_result() {
        let delivery = Delivery::ready(Ok("1700000000000-0".to_string()));
        assert_eq!(delivery.outcome().await.unwrap(), "1700000000000-0");
    }

    #[tokio::test]
    async fn test_channel_delivery_resolves_when_sent() {
        let (tx, delivery) = Delivery::channel();
        tx.send(Err(StreamError::Dispatch("broker unreachable".to_string())))
            .unwrap();

        let err = delivery.outcome().await.unwrap_err();
        assert!(err.to_string().contains("broker unreachable"));
    }

    #[tokio::test]
    async fn test_abandoned_delivery_is_an_error() {
        let (tx, delivery) = Delivery::channel();
        drop(tx);

        assert!(matches!(delivery.outcome().await, Err(StreamError::Dispatch(_))));
    }
}
