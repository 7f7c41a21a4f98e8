//! Application configuration loaded from environment variables.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Users API ===
    /// Origin serving `/api/users` and `/api/health`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Request timeout for every API call.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    // === Polling ===
    /// Interval between user list refreshes.
    #[serde(default = "default_users_poll_interval")]
    pub users_poll_interval_ms: u64,

    /// Interval between health checks.
    #[serde(default = "default_health_poll_interval")]
    pub health_poll_interval_ms: u64,

    /// How long a notice stays on screen.
    #[serde(default = "default_notice_ttl")]
    pub notice_ttl_ms: u64,

    // === Observability ===
    /// Expose Prometheus metrics over HTTP.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Port for the Prometheus listener.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_http_timeout() -> u64 {
    30_000
}

fn default_users_poll_interval() -> u64 {
    5_000
}

fn default_health_poll_interval() -> u64 {
    10_000
}

fn default_notice_ttl() -> u64 {
    5_000
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            http_timeout_ms: default_http_timeout(),
            users_poll_interval_ms: default_users_poll_interval(),
            health_poll_interval_ms: default_health_poll_interval(),
            notice_ttl_ms: default_notice_ttl(),
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
            rust_log: default_log_level(),
            log_json: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.api_base_url)
            .map_err(|e| format!("API_BASE_URL is not a valid URL: {}", e))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err("API_BASE_URL must use http or https".to_string());
        }

        if self.users_poll_interval_ms == 0 {
            return Err("USERS_POLL_INTERVAL_MS must be greater than 0".to_string());
        }

        if self.health_poll_interval_ms == 0 {
            return Err("HEALTH_POLL_INTERVAL_MS must be greater than 0".to_string());
        }

        if self.http_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS must be greater than 0".to_string());
        }

        Ok(())
    }

    /// HTTP request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}
