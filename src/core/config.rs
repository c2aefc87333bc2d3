//! Configuration management for the gateway.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (via dotenvy) with sensible defaults.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default NocoDB instance used when `NOCODB_URL` is not set.
const DEFAULT_NOCODB_URL: &str = "https://nocodb.v1su4.com";

/// Main configuration structure for the gateway.
///
/// All configurable aspects of the process, organized by domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// HTTP listener configuration.
    pub http: HttpConfig,

    /// Downstream NocoDB connection configuration.
    pub nocodb: NocoDbConfig,

    /// Per-client rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind to.
    pub host: String,

    /// Port number to listen on.
    pub port: u16,
}

/// Downstream NocoDB connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct NocoDbConfig {
    /// Base URL of the NocoDB instance (no trailing slash).
    pub base_url: String,

    /// API token sent as the `xc-token` header. Optional at startup: the
    /// process starts and serves `/health` without one, but data operations
    /// fail until a token is supplied (here or per call).
    pub api_token: Option<String>,
}

/// Custom Debug implementation to redact the token from logs.
impl std::fmt::Debug for NocoDbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NocoDbConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Per-client rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Length of the fixed window in seconds.
    pub window_secs: u64,

    /// Number of admitted calls per window per client identity.
    pub max_requests: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "nocodb-gateway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            http: HttpConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
            },
            nocodb: NocoDbConfig {
                base_url: DEFAULT_NOCODB_URL.to_string(),
                api_token: None,
            },
            rate_limit: RateLimitConfig {
                window_secs: 60,
                max_requests: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Recognized keys: `NOCODB_URL`, `NOCODB_API_TOKEN`, `HOST`, `PORT`,
    /// `LOG_LEVEL`, `RATE_LIMIT_WINDOW_SECS`, `RATE_LIMIT_MAX_REQUESTS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = std::env::var("NOCODB_URL") {
            config.nocodb.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(token) = std::env::var("NOCODB_API_TOKEN") {
            config.nocodb.api_token = Some(token);
            info!("NocoDB API token loaded from environment");
        } else {
            warn!(
                "NOCODB_API_TOKEN not set - data operations will fail until a \
                 token is supplied (environment or per-call 'api_token' argument)"
            );
        }

        if let Ok(host) = std::env::var("HOST") {
            config.http.host = host;
        }

        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => config.http.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {}", port),
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(window) = std::env::var("RATE_LIMIT_WINDOW_SECS") {
            if let Ok(window) = window.parse() {
                config.rate_limit.window_secs = window;
            }
        }

        if let Ok(max) = std::env::var("RATE_LIMIT_MAX_REQUESTS") {
            if let Ok(max) = max.parse() {
                config.rate_limit.max_requests = max;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.http.port, 3001);
        assert_eq!(config.nocodb.base_url, DEFAULT_NOCODB_URL);
        assert!(config.nocodb.api_token.is_none());
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.rate_limit.max_requests, 30);
    }

    #[test]
    fn test_url_trailing_slash_stripped() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("NOCODB_URL", "https://db.example.com/");
        }
        let config = Config::from_env();
        assert_eq!(config.nocodb.base_url, "https://db.example.com");
        unsafe {
            std::env::remove_var("NOCODB_URL");
        }
    }

    #[test]
    fn test_token_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("NOCODB_API_TOKEN", "tok_12345");
        }
        let config = Config::from_env();
        assert_eq!(config.nocodb.api_token.as_deref(), Some("tok_12345"));
        unsafe {
            std::env::remove_var("NOCODB_API_TOKEN");
        }
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("PORT", "not-a-port");
        }
        let config = Config::from_env();
        assert_eq!(config.http.port, 3001);
        unsafe {
            std::env::remove_var("PORT");
        }
    }

    #[test]
    fn test_token_redacted_in_debug() {
        let nocodb = NocoDbConfig {
            base_url: DEFAULT_NOCODB_URL.to_string(),
            api_token: Some("super_secret_token".to_string()),
        };
        let debug_str = format!("{:?}", nocodb);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_token"));
    }
}
