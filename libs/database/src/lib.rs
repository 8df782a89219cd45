//! Connectors for the service's backing stores.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL via SeaORM, migrations, health checks
//! - `redis` (default) - Redis connection manager and health checks
//! - `config` - `core_config::FromEnv` implementations for the config types
//!
//! # Example
//!
//! ```ignore
//! use database::{postgres, redis};
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config_with_retry(pg_config, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "users_api").await?;
//!
//! let conn = redis::connect_from_config_with_retry(redis_config, None).await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

pub use common::{DatabaseError, DatabaseResult};
