//! Payment service configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3002`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON logs, anything else for plain text
/// - `DATABASE_URL`: Postgres connection string; unset runs on the in-memory store
/// - `BOOKING_SERVICE_URL`: booking service base URL for booking lookups
/// - `BOOKING_WEBHOOK_URL`: where `payment.*` notifications are posted
/// - `HTTP_TIMEOUT_SECS`: outbound request timeout (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
    pub database_url: Option<String>,
    pub booking_service_url: String,
    pub booking_webhook_url: String,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: std::env::var("LOG_FORMAT").unwrap_or(defaults.log_format),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            booking_service_url: std::env::var("BOOKING_SERVICE_URL")
                .unwrap_or(defaults.booking_service_url),
            booking_webhook_url: std::env::var("BOOKING_WEBHOOK_URL")
                .unwrap_or(defaults.booking_webhook_url),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
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

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3002,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            database_url: None,
            booking_service_url: "http://localhost:3001".to_string(),
            booking_webhook_url: "http://localhost:3001/bookings/webhook/payment".to_string(),
            http_timeout_secs: 10,
        }
    }
}
