//! Configuration for the check-in service.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::aggregates::checkin::DEFAULT_FRESHNESS_WINDOW_MS;
use crate::feed::DEFAULT_FEED_CAPACITY;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but does not parse
    #[error("Invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Validation service configuration
    pub checkin: CheckInConfig,
    /// Scan client configuration
    pub scanner: ScannerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log filter (trace, debug, info, warn, error, or an `EnvFilter` directive)
    pub log_level: String,
    /// Metrics server host (for Prometheus scraping)
    pub metrics_host: String,
    /// Metrics server port
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Validation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInConfig {
    /// Maximum payload age (and future skew), milliseconds
    pub freshness_window_ms: i64,
    /// Records kept in the operator feed
    pub feed_capacity: usize,
    /// How long a request waits for its outcome, milliseconds
    pub validation_timeout_ms: u64,
    /// Automatic QR rotation period, seconds
    pub qr_rotation_interval_secs: u64,
    /// Shared passphrase for the kiosk routes; `None` leaves them open
    #[serde(skip_serializing)]
    pub kiosk_passphrase: Option<String>,
}

/// Scan client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Base URL of the validation service
    pub base_url: String,
    /// Round-trip bound for one submission, milliseconds
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                log_level: "info".to_string(),
                metrics_host: "0.0.0.0".to_string(),
                metrics_port: 9090,
                shutdown_timeout: 30,
            },
            checkin: CheckInConfig {
                freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
                feed_capacity: DEFAULT_FEED_CAPACITY,
                validation_timeout_ms: 10_000,
                qr_rotation_interval_secs: 30,
                kiosk_passphrase: None,
            },
            scanner: ScannerConfig {
                base_url: "http://localhost:8080".to_string(),
                request_timeout_ms: 10_000,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if a set variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or(defaults.server.host),
                port: parse(&lookup, "PORT", defaults.server.port)?,
                log_level: lookup("RUST_LOG").unwrap_or(defaults.server.log_level),
                metrics_host: lookup("METRICS_HOST").unwrap_or(defaults.server.metrics_host),
                metrics_port: parse(&lookup, "METRICS_PORT", defaults.server.metrics_port)?,
                shutdown_timeout: parse(
                    &lookup,
                    "SHUTDOWN_TIMEOUT",
                    defaults.server.shutdown_timeout,
                )?,
            },
            checkin: CheckInConfig {
                freshness_window_ms: parse(
                    &lookup,
                    "CHECKIN_FRESHNESS_WINDOW_MS",
                    defaults.checkin.freshness_window_ms,
                )?,
                feed_capacity: parse(
                    &lookup,
                    "CHECKIN_FEED_CAPACITY",
                    defaults.checkin.feed_capacity,
                )?,
                validation_timeout_ms: parse(
                    &lookup,
                    "CHECKIN_VALIDATION_TIMEOUT_MS",
                    defaults.checkin.validation_timeout_ms,
                )?,
                qr_rotation_interval_secs: parse(
                    &lookup,
                    "QR_ROTATION_INTERVAL_SECS",
                    defaults.checkin.qr_rotation_interval_secs,
                )?,
                kiosk_passphrase: lookup("KIOSK_PASSPHRASE").filter(|p| !p.is_empty()),
            },
            scanner: ScannerConfig {
                base_url: lookup("SCANNER_BASE_URL").unwrap_or(defaults.scanner.base_url),
                request_timeout_ms: parse(
                    &lookup,
                    "SCANNER_REQUEST_TIMEOUT_MS",
                    defaults.scanner.request_timeout_ms,
                )?,
            },
        })
    }

    /// Socket address string for the HTTP server
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Socket address string for the metrics exporter
    #[must_use]
    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.server.metrics_host, self.server.metrics_port)
    }
}

impl CheckInConfig {
    /// Outcome wait bound
    #[must_use]
    pub const fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    /// QR rotation period
    #[must_use]
    pub const fn qr_rotation_interval(&self) -> Duration {
        Duration::from_secs(self.qr_rotation_interval_secs)
    }
}

impl ScannerConfig {
    /// Submission round-trip bound
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
