//! Booking service configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3001`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for plain text
/// - `DATABASE_URL`: Postgres connection string; unset runs on the in-memory store
/// - `USER_SERVICE_URL`: identity service base URL (default: `http://localhost:3000`)
/// - `PAYMENT_WEBHOOK_URL`: where `booking.*` notifications are posted
/// - `SWEEP_INTERVAL_SECS`: expiry sweep period (default: `30`)
/// - `SEED_DEMO_DATA`: seed sample events into an empty store (default: `false`)
/// - `HTTP_TIMEOUT_SECS`: outbound request timeout (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
    pub database_url: Option<String>,
    pub user_service_url: String,
    pub payment_webhook_url: String,
    pub sweep_interval_secs: u64,
    pub seed_demo_data: bool,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: std::env::var("LOG_FORMAT").unwrap_or(defaults.log_format),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            user_service_url: std::env::var("USER_SERVICE_URL")
                .unwrap_or(defaults.user_service_url),
            payment_webhook_url: std::env::var("PAYMENT_WEBHOOK_URL")
                .unwrap_or(defaults.payment_webhook_url),
            sweep_interval_secs: parse_var("SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.sweep_interval_secs),
            seed_demo_data: std::env::var("SEED_DEMO_DATA")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.seed_demo_data),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.http_timeout_secs),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            database_url: None,
            user_service_url: "http://localhost:3000".to_string(),
            payment_webhook_url: "http://localhost:3002/payments/webhook/booking".to_string(),
            sweep_interval_secs: 30,
            seed_demo_data: false,
            http_timeout_secs: 10,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
