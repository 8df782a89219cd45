use crate::resilience::{CircuitBreakerConfig, RetryPolicy};
use core_config::{env_parse, ConfigError, FromEnv};
use std::time::Duration;

impl FromEnv for CircuitBreakerConfig {
    /// - EVENTS_CB_FAILURE_THRESHOLD: defaults to 5
    /// - EVENTS_CB_COOLDOWN_SECS: defaults to 30
    /// - EVENTS_RETRY_MAX_ATTEMPTS: defaults to 3
    /// - EVENTS_RETRY_BACKOFF_MS: initial backoff, defaults to 200, capped at the max backoff
    fn from_env() -> Result<Self, ConfigError> {
        let failure_threshold: u32 = env_parse("EVENTS_CB_FAILURE_THRESHOLD", 5)?;
        let cooldown_secs: u64 = env_parse("EVENTS_CB_COOLDOWN_SECS", 30)?;
        let max_attempts: u32 = env_parse("EVENTS_RETRY_MAX_ATTEMPTS", 3)?;
        let backoff_ms: u64 = env_parse("EVENTS_RETRY_BACKOFF_MS", 200)?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::from_millis(backoff_ms).min(defaults.max_backoff),
            ..defaults
        };

        Ok(CircuitBreakerConfig::new()
            .with_failure_threshold(failure_threshold)
            .with_cooldown(Duration::from_secs(cooldown_secs))
            .with_retry(retry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 4] = [
        "EVENTS_CB_FAILURE_THRESHOLD",
        "EVENTS_CB_COOLDOWN_SECS",
        "EVENTS_RETRY_MAX_ATTEMPTS",
        "EVENTS_RETRY_BACKOFF_MS",
    ];

    #[test]
    fn test_defaults_when_unset() {
        temp_env::with_vars(VARS.map(|k| (k, None::<&str>)), || {
            let config = CircuitBreakerConfig::from_env().unwrap();
            assert_eq!(config.failure_threshold, 5);
            assert_eq!(config.cooldown, Duration::from_secs(30));
            assert_eq!(config.retry.max_attempts, 3);
            assert_eq!(config.retry.initial_backoff, Duration::from_millis(200));
        });
    }

    #[test]
    fn test_overrides_from_env() {
        temp_env::with_vars(
            [
                ("EVENTS_CB_FAILURE_THRESHOLD", Some("2")),
                ("EVENTS_CB_COOLDOWN_SECS", Some("5")),
                ("EVENTS_RETRY_MAX_ATTEMPTS", Some("1")),
                ("EVENTS_RETRY_BACKOFF_MS", Some("50")),
            ],
            || {
                let config = CircuitBreakerConfig::from_env().unwrap();
                assert_eq!(config.failure_threshold, 2);
                assert_eq!(config.cooldown, Duration::from_secs(5));
                assert_eq!(config.retry.max_attempts, 1);
                assert_eq!(config.retry.initial_backoff, Duration::from_millis(50));
            },
        );
    }

    #[test]
    fn test_backoff_above_cap_is_clamped() {
        temp_env::with_var("EVENTS_RETRY_BACKOFF_MS", Some("60000"), || {
            let config = CircuitBreakerConfig::from_env().unwrap();
            assert_eq!(config.retry.initial_backoff, config.retry.max_backoff);
        });
    }

    #[test]
    fn test_invalid_value_is_a_parse_error() {
        temp_env::with_var("EVENTS_CB_COOLDOWN_SECS", Some("soon"), || {
            let err = CircuitBreakerConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "EVENTS_CB_COOLDOWN_SECS"));
        });
    }
}
