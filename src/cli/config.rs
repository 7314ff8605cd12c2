//! Configuration file
//!
//! JSON file; every field is optional. A missing file means defaults.
//! The webhook secret never lives in the file: it is read from the
//! environment variable named by `secret_env`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::bootstrap::DEFAULT_AUTHORITY_URL;
use crate::http_server::realtime_routes::DEFAULT_OUTBOUND_QUEUE_CAPACITY;
use crate::http_server::{HttpServerConfig, WebhookSecret};
use crate::realtime::DEFAULT_PROBE_INTERVAL;

/// Default environment variable holding the webhook secret
pub const DEFAULT_SECRET_ENV: &str = "WEBHOOK_KEY";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Bind address and CORS
    #[serde(flatten)]
    pub http: HttpServerConfig,

    /// Base URL of the revision authority
    #[serde(default = "default_authority_url")]
    pub authority_url: String,

    /// Liveness probe period in seconds
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Per-connection outbound queue capacity
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,

    /// Environment variable holding the webhook secret
    #[serde(default = "default_secret_env")]
    pub secret_env: String,
}

fn default_authority_url() -> String {
    DEFAULT_AUTHORITY_URL.to_string()
}

fn default_heartbeat_interval_secs() -> u64 {
    DEFAULT_PROBE_INTERVAL.as_secs()
}

fn default_outbound_queue_capacity() -> usize {
    DEFAULT_OUTBOUND_QUEUE_CAPACITY
}

fn default_secret_env() -> String {
    DEFAULT_SECRET_ENV.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpServerConfig::default(),
            authority_url: default_authority_url(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            secret_env: default_secret_env(),
        }
    }
}

impl Config {
    /// Load configuration from file, or defaults if it does not exist
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.heartbeat_interval_secs == 0 {
            return Err(CliError::config_error("heartbeat_interval_secs must be > 0"));
        }

        if self.outbound_queue_capacity == 0 {
            return Err(CliError::config_error("outbound_queue_capacity must be > 0"));
        }

        if self.authority_url.trim().is_empty() {
            return Err(CliError::config_error("authority_url must not be empty"));
        }

        if self.secret_env.trim().is_empty() {
            return Err(CliError::config_error("secret_env must not be empty"));
        }

        Ok(())
    }

    /// Liveness probe period
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Read the webhook secret from the environment
    pub fn webhook_secret(&self) -> CliResult<WebhookSecret> {
        secret_from(&self.secret_env, std::env::var(&self.secret_env).ok())
    }
}

fn secret_from(var: &str, value: Option<String>) -> CliResult<WebhookSecret> {
    value
        .and_then(WebhookSecret::new)
        .ok_or_else(|| CliError::missing_secret(var))
}
