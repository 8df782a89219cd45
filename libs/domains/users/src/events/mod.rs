//! Reliable publication of user change events.
//!
//! ```text
//! UserService ──announce──▶ UserEventDispatcher ──CircuitGuard──▶ EventPublisher ──▶ Redis stream
//!                                   │ fallback / async failure
//!                                   ▼
//!                           PendingEventStore ◀── RecoverySweeper (every 30s, purge daily 02:00)
//! ```

pub mod config;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod model;
pub mod postgres;
pub mod publisher;
pub mod scheduler;
pub mod store;
pub mod sweeper;

pub use config::RecoveryConfig;
pub use dispatcher::UserEventDispatcher;
pub use error::{EventError, EventResult};
pub use model::{CREATED, DELETED, PendingEvent, UserEvent};
pub use postgres::PgPendingEventStore;
pub use publisher::{EventPublisher, FailureMode, InMemoryEventPublisher, StreamEventPublisher, UserEventStream};
pub use scheduler::RecoveryScheduler;
pub use store::{InMemoryPendingEventStore, PendingEventStore};
pub use sweeper::{RecoverySweeper, SweepReport};
