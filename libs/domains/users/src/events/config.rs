use chrono::TimeDelta;
use core_config::{env_or_default, env_parse, ConfigError, FromEnv};
use std::time::Duration;

/// Daily at 02:00 UTC (`sec min hour day month weekday`)
pub const DEFAULT_PURGE_CRON: &str = "0 0 2 * * *";

/// Redelivery and cleanup settings for pending events
#[derive(Clone, Debug, PartialEq)]
pub struct RecoveryConfig {
    /// Failed attempts after which an event is no longer redelivered
    pub max_retries: i32,
    pub sweep_interval: Duration,
    /// How long one redelivery waits for the broker's acknowledgement
    pub delivery_timeout: Duration,
    /// Events older than this are purged, processed or not
    pub retention: TimeDelta,
    pub purge_cron: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            sweep_interval: Duration::from_secs(30),
            delivery_timeout: Duration::from_secs(5),
            retention: TimeDelta::days(7),
            purge_cron: DEFAULT_PURGE_CRON.to_string(),
        }
    }
}

impl FromEnv for RecoveryConfig {
    /// - EVENTS_MAX_RETRIES: defaults to 5
    /// - EVENTS_SWEEP_INTERVAL_SECS: defaults to 30
    /// - EVENTS_DELIVERY_TIMEOUT_SECS: defaults to 5
    /// - EVENTS_RETENTION_DAYS: defaults to 7
    /// - EVENTS_PURGE_CRON: defaults to "0 0 2 * * *"
    fn from_env() -> Result<Self, ConfigError> {
        let max_retries: i32 = env_parse("EVENTS_MAX_RETRIES", 5)?;
        let sweep_secs: u64 = env_parse("EVENTS_SWEEP_INTERVAL_SECS", 30)?;
        let delivery_timeout_secs: u64 = env_parse("EVENTS_DELIVERY_TIMEOUT_SECS", 5)?;
        let retention_days: i64 = env_parse("EVENTS_RETENTION_DAYS", 7)?;

        if max_retries < 1 {
            return Err(ConfigError::ParseError {
                key: "EVENTS_MAX_RETRIES".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        let retention = TimeDelta::try_days(retention_days)
            .filter(|d| *d > TimeDelta::zero())
            .ok_or_else(|| ConfigError::ParseError {
                key: "EVENTS_RETENTION_DAYS".to_string(),
                details: format!("{retention_days} is not a usable number of days"),
            })?;

        Ok(Self {
            max_retries,
            sweep_interval: Duration::from_secs(sweep_secs.max(1)),
            delivery_timeout: Duration::from_secs(delivery_timeout_secs.max(1)),
            retention,
            purge_cron: env_or_default("EVENTS_PURGE_CRON", DEFAULT_PURGE_CRON),
        })
    }
}
