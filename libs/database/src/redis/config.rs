#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv};

/// Redis connection settings
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// e.g. `redis://127.0.0.1:6379/0`
    pub url: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379")
    }
}

/// Reads `REDIS_URL`, falling back to `REDIS_HOST`. One of them is required.
#[cfg(feature = "config")]
impl FromEnv for RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("REDIS_URL")
            .or_else(|_| std::env::var("REDIS_HOST"))
            .map_err(|_| ConfigError::MissingEnvVar("REDIS_URL or REDIS_HOST".to_string()))?;

        Ok(Self { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_default_points_at_localhost() {
        assert_eq!(RedisConfig::default().url, "redis://127.0.0.1:6379");
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_redis_config_prefers_redis_url() {
        temp_env::with_vars(
            [
                ("REDIS_URL", Some("redis://cache:6379")),
                ("REDIS_HOST", Some("redis://legacy:6379")),
            ],
            || {
                assert_eq!(RedisConfig::from_env().unwrap().url, "redis://cache:6379");
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_redis_config_missing() {
        temp_env::with_vars_unset(["REDIS_URL", "REDIS_HOST"], || {
            let err = RedisConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("REDIS_URL"));
        });
    }
}
