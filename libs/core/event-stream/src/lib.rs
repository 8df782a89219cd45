//! Event Stream
//!
//! Outbound side of Redis Streams plus the resilience wrapper used around it.
//!
//! ## Features
//!
//! - **Producer**: `StreamProducer` appends keyed JSON entries with `XADD ... MAXLEN ~`
//!   on a background task and hands back a [`Delivery`] the caller may await or drop
//! - **Circuit guard**: `CircuitGuard` combines bounded retry with a
//!   closed / open / half-open breaker and a caller-supplied fallback
//!
//! ## Example
//!
//! ```ignore
//! use event_stream::{CircuitGuard, CircuitBreakerConfig, StreamDef, StreamProducer};
//!
//! struct AuditStream;
//! impl StreamDef for AuditStream {
//!     const STREAM_NAME: &'static str = "audit-events";
//! }
//!
//! let producer = StreamProducer::from_stream_def::<AuditStream>(redis);
//! let guard = CircuitGuard::new("audit-publish", CircuitBreakerConfig::default());
//!
//! let stored = guard
//!     .call(
//!         || async { producer.dispatch_keyed("user@example.com", &event) },
//!         |err| async move { park_for_later(err).await },
//!     )
//!     .await;
//! ```

mod config;
mod error;
mod producer;
mod registry;
mod resilience;

pub use error::StreamError;
pub use producer::{Delivery, StreamProducer};
pub use registry::StreamDef;
pub use resilience::{CircuitBreakerConfig, CircuitGuard, CircuitState, GuardError, RetryPolicy};
