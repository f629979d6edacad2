//! Configuration management for the analytics server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const MAX_LIVE_TTL_SECS: u64 = 86_400;
const MAX_SESSION_COOKIE_DAYS: i64 = 3_650;
const MAX_COUNTED_COOKIE_HOURS: i64 = 168;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

/// Visit counting and live feed tuning
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Cadence of live count pushes, also the presence refresh interval
    pub heartbeat_secs: u64,
    /// Silence after which a live entry is dropped
    pub live_ttl_secs: u64,
    pub session_cookie_days: i64,
    pub counted_cookie_hours: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub redis_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // ANALYTICS__STORAGE__BACKEND=redis
            .add_source(
                Environment::with_prefix("ANALYTICS")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("storage.redis_url", env::var("REDIS_URL").ok())?
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.analytics.validate()?;
        Ok(config)
    }
}

impl AnalyticsConfig {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    pub fn live_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.live_ttl_secs.min(MAX_LIVE_TTL_SECS) as i64)
    }

    /// Reject settings that would expire connected clients or overflow durations
    pub fn validate(&self) -> Result<(), ConfigError> {
        let heartbeat = self.heartbeat().as_secs();
        if self.live_ttl_secs < heartbeat {
            return Err(ConfigError::Message(format!(
                "analytics.live_ttl_secs ({}) must be at least analytics.heartbeat_secs ({})",
                self.live_ttl_secs, heartbeat
            )));
        }
        if self.live_ttl_secs > MAX_LIVE_TTL_SECS {
            return Err(ConfigError::Message(format!(
                "analytics.live_ttl_secs must not exceed {}",
                MAX_LIVE_TTL_SECS
            )));
        }
        if !(1..=MAX_SESSION_COOKIE_DAYS).contains(&self.session_cookie_days) {
            return Err(ConfigError::Message(format!(
                "analytics.session_cookie_days must be between 1 and {}",
                MAX_SESSION_COOKIE_DAYS
            )));
        }
        if !(1..=MAX_COUNTED_COOKIE_HOURS).contains(&self.counted_cookie_hours) {
            return Err(ConfigError::Message(format!(
                "analytics.counted_cookie_hours must be between 1 and {}",
                MAX_COUNTED_COOKIE_HOURS
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: 5,
            live_ttl_secs: 15,
            session_cookie_days: 365,
            counted_cookie_hours: 24,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}
