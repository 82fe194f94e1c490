//! HTTP Server Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080, 0 = ephemeral)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bound on handling one request (default: 10000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// CORS allowed origins (default: none, cross-origin requests refused)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.cors_origins.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = HttpServerConfig::with_port(9000);
        assert_eq!(config.socket_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_partial_json() {
        let config: HttpServerConfig = serde_json::from_str(r#"{"port": 0}"#).unwrap();
        assert_eq!(config.port, 0);
        assert_eq!(config.request_timeout_ms, 10_000);
    }
}
