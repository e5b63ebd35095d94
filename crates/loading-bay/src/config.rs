//! # Bay Configuration
//!
//! Layered settings: built-in defaults, then an optional TOML file, then environment
//! variables.
//!
//! ```text
//! loading-bay.toml          (or the path in LOADING_BAY_CONFIG)
//! LOADING_BAY_SLOT_MINUTES=45
//! LOADING_BAY_STORE__TIMEOUT_MS=2000
//! ```
//!
//! ```rust
//! use loading_bay::config::BayConfig;
//!
//! let config = BayConfig::default();
//! assert_eq!(config.slot_minutes, 30);
//! assert_eq!(config.utc_offset_minutes, 420);
//! ```

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_PATH_ENV: &str = "LOADING_BAY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "loading-bay";
pub const ENV_PREFIX: &str = "LOADING_BAY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayConfig {
    /// Minutes credited to every order ahead when estimating a wait.
    pub slot_minutes: u32,
    /// Offset of the bay's local time from UTC. Queue numbers restart at local midnight.
    pub utc_offset_minutes: i32,
    /// Base for invoice, queue and delivery links sent to clients.
    pub client_base_url: String,
    pub store: StoreConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound on a single store call.
    pub timeout_ms: u64,
    /// Mailbox size of each store actor.
    pub channel_capacity: usize,
}

/// Backoff for commands that lose a conditional write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for BayConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            utc_offset_minutes: 7 * 60,
            client_base_url: "http://localhost:3000".to_string(),
            store: StoreConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            channel_capacity: 64,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 16,
            base_backoff_ms: 2,
            max_backoff_ms: 100,
        }
    }
}

impl BayConfig {
    /// Load from `LOADING_BAY_CONFIG` (or `loading-bay.toml` if unset) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load with `path` as the optional file layer. A missing file is not an error.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        debug!(path, "Loading configuration");
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: BayConfig = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_minutes == 0 {
            return Err(ConfigError::Invalid("slot_minutes must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be positive".into()));
        }
        if self.store.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "store.channel_capacity must be positive".into(),
            ));
        }
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::Invalid("store.timeout_ms must be positive".into()));
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        // Offsets beyond +/-14h do not exist in practice.
        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} is out of range",
                self.utc_offset_minutes
            )));
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_minutes {} is out of range",
                self.utc_offset_minutes
            ))
        })
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }

    pub fn client_url(&self, path: &str) -> String {
        format!("{}/{}", self.client_base_url.trim_end_matches('/'), path)
    }
}
