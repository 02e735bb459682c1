use std::time::Duration;

use serde::Deserialize;

use crate::cache::token_cache::{CacheSettings, REFRESH_SKEW_SECONDS_DEFAULT, REFRESH_TIMEOUT_MS_DEFAULT};
use crate::resilience::retry::RetrySettings;
use crate::utils::constants::{DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_METRICS_PATH, DEFAULT_PORT};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub token: TokenConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

/// ================================
/// Token cache
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    /// token is refreshed this many seconds before it expires
    #[serde(default = "default_refresh_skew_seconds")]
    pub refresh_skew_seconds: u64,
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            refresh_skew_seconds: default_refresh_skew_seconds(),
            refresh_timeout_ms: default_refresh_timeout_ms(),
            retry: RetrySettings::default(),
        }
    }
}

impl TokenConfig {
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            refresh_skew: Duration::from_secs(self.refresh_skew_seconds),
            refresh_timeout: Duration::from_millis(self.refresh_timeout_ms),
            retry: self.retry,
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // allowed: trace, debug, info, warn, error
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(default_log_level(), LogFormat::default())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}

fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_owned()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_owned()
}

fn default_refresh_skew_seconds() -> u64 {
    REFRESH_SKEW_SECONDS_DEFAULT
}

fn default_refresh_timeout_ms() -> u64 {
    REFRESH_TIMEOUT_MS_DEFAULT
}
