//! Application state management.
//!
//! Shared state passed to the users routes and the readiness probe:
//! - Configuration
//! - Database connections (PostgreSQL, Redis)
//! - The guarded event dispatcher shared by every request

use domain_users::events::UserEventDispatcher;
use std::sync::Arc;

/// Shared application state.
///
/// Cloned per handler; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL database connection pool
    pub db: database::postgres::DatabaseConnection,
    /// Redis connection manager
    pub redis: database::redis::ConnectionManager,
    /// Publishes user events behind the circuit guard
    pub events: Arc<UserEventDispatcher>,
}
