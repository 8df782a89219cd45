//! Users Domain
//!
//! User directory with reliable change-event publication.
//!
//! # Features
//!
//! - User CRUD with field validation and unique emails
//! - `CREATED` / `DELETED` events published to a Redis stream behind a circuit guard
//! - Undeliverable events parked in `pending_user_events` and redelivered on a schedule
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌──────────────────────┐
//! │   Service   │ ───▶ │  events::dispatcher  │  ← guarded publish, pending fallback
//! └──────┬──────┘      └──────────────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + Postgres / in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Records, DTOs, validation rules
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{events::*, handlers, InMemoryUserRepository, UserService};
//! use event_stream::{CircuitBreakerConfig, CircuitGuard};
//! use std::sync::Arc;
//!
//! let dispatcher = UserEventDispatcher::new(
//!     Arc::new(InMemoryEventPublisher::new()),
//!     Arc::new(InMemoryPendingEventStore::new()),
//!     Arc::new(CircuitGuard::new("user-events", CircuitBreakerConfig::default())),
//! );
//! let service = UserService::new(InMemoryUserRepository::new(), Arc::new(dispatcher));
//!
//! let router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod events;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use handlers::UsersApiDoc;
pub use models::{CreateUser, EmailQuery, UpdateUser, User, UserResponse};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
