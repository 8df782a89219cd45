//! Outbound user events.
//!
//! [`EventPublisher::publish`] fails fast only for problems detected before
//! the broker is involved. The broker's acknowledgement arrives through the
//! returned [`Delivery`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use event_stream::{Delivery, StreamDef, StreamError, StreamProducer};

use super::model::UserEvent;

/// Redis stream carrying user change events
pub struct UserEventStream;

impl StreamDef for UserEventStream {
    const STREAM_NAME: &'static str = "user-events-topic";
}

#[cfg_attr(test, mockall::automock)]
pub trait EventPublisher: Send + Sync {
    /// Start publishing `event`, keyed by its email.
    fn publish(&self, event: &UserEvent) -> Result<Delivery, StreamError>;
}

/// Publishes to [`UserEventStream`] through a Redis stream producer.
#[derive(Clone)]
pub struct StreamEventPublisher {
    producer: StreamProducer,
}

impl StreamEventPublisher {
    pub fn new(producer: StreamProducer) -> Self {
        Self { producer }
    }
}

impl EventPublisher for StreamEventPublisher {
    fn publish(&self, event: &UserEvent) -> Result<Delivery, StreamError> {
        self.producer.dispatch_keyed(&event.email, event)
    }
}

/// How [`InMemoryEventPublisher`] answers a publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    #[default]
    None,
    /// `publish` returns `Err` straight away
    Sync,
    /// `publish` succeeds but the delivery resolves to an error
    Async,
}

/// Records events instead of sending them (for development/testing)
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    published: Arc<Mutex<Vec<UserEvent>>>,
    mode: Arc<Mutex<FailureMode>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failure_mode(&self, mode: FailureMode) {
        *lock(&self.mode) = mode;
    }

    /// Events acknowledged so far, oldest first.
    pub fn published(&self) -> Vec<UserEvent> {
        lock(&self.published).clone()
    }
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, event: &UserEvent) -> Result<Delivery, StreamError> {
        match *lock(&self.mode) {
            FailureMode::Sync => Err(StreamError::Dispatch("broker unavailable".to_string())),
            FailureMode::Async => Ok(Delivery::ready(Err(StreamError::Dispatch(
                "broker rejected the write".to_string(),
            )))),
            FailureMode::None => {
                let mut published = lock(&self.published);
                published.push(event.clone());
                Ok(Delivery::ready(Ok(format!("{}-0", published.len()))))
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
