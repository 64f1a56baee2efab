//! Configuration management for Turnstile.
//!
//! Configuration is read from a file (JSON, YAML or TOML, picked by
//! extension) and may be overridden by `TURNSTILE_*` environment variables,
//! with `__` separating nested keys, e.g. `TURNSTILE_SERVER__PORT=8080`.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TurnstileError};

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "TURNSTILE";

/// Main configuration for the Turnstile service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Token bucket settings, one bucket per entry
    #[serde(default)]
    pub rate_limits_per_endpoint: Vec<EndpointLimit>,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long in-flight requests may keep the server alive after shutdown
    /// is requested
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Graceful shutdown drain limit.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3003
}

fn default_shutdown_timeout() -> u64 {
    5
}

/// Rate limit settings for a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointLimit {
    /// Route template being limited, e.g. `GET /user/:id`
    pub endpoint: String,

    /// Maximum number of tokens in the bucket
    pub burst: u64,

    /// Sustained requests per minute
    pub sustained: u64,
}

impl AppConfig {
    /// Load configuration from a file, applying environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json)
            .map_err(|e| TurnstileError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive the service.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limits_per_endpoint.is_empty() {
            return Err(TurnstileError::Config(
                "rate limiting configuration is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
server:
  port: 8080
rate_limits_per_endpoint:
  - endpoint: "GET /user/:id"
    burst: 5
    sustained: 60
  - endpoint: "PATCH /user/:id"
    burst: 10
    sustained: 20
"#;

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();

        assert_eq!(server.socket_addr(), "0.0.0.0:3003".parse().unwrap());
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_yaml() {
        let config = AppConfig::from_yaml(YAML).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.rate_limits_per_endpoint.len(), 2);
        assert_eq!(
            config.rate_limits_per_endpoint[0],
            EndpointLimit {
                endpoint: "GET /user/:id".to_string(),
                burst: 5,
                sustained: 60,
            }
        );
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "rate_limits_per_endpoint": [
                { "endpoint": "GET /user/:id", "burst": 5, "sustained": 60 }
            ]
        }"#;

        let config = AppConfig::from_json(json).unwrap();

        assert_eq!(config.server.port, 3003);
        assert_eq!(config.rate_limits_per_endpoint[0].burst, 5);
    }

    #[test]
    fn test_missing_rate_limits_rejected() {
        let result = AppConfig::from_yaml("server:\n  port: 8080\n");

        match result {
            Err(TurnstileError::Config(msg)) => {
                assert_eq!(msg, "rate limiting configuration is required")
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = AppConfig::from_json("{ not json");
        assert!(matches!(result, Err(TurnstileError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(YAML.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.rate_limits_per_endpoint.len(), 2);
        assert_eq!(config.rate_limits_per_endpoint[1].endpoint, "PATCH /user/:id");
        assert_eq!(config.rate_limits_per_endpoint[1].sustained, 20);
    }

    #[test]
    fn test_from_missing_file() {
        let result = AppConfig::from_file("/nonexistent/turnstile.yaml");
        assert!(matches!(result, Err(TurnstileError::ConfigSource(_))));
    }
}
