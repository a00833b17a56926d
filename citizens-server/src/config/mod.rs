//! Server configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

use crate::cli::CliArgs;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_request_size: 16 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Create configuration from CLI arguments and process environment
    pub fn from_cli_and_env(cli_args: &CliArgs) -> Result<Self> {
        Self::from_sources(cli_args, |key| env::var(key).ok())
    }

    /// Create configuration from CLI arguments and an environment lookup
    ///
    /// CLI arguments take precedence over environment variables.
    pub fn from_sources<F>(cli_args: &CliArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = &cli_args.host {
            config.host = host.clone();
        } else if let Some(host) = env("CITIZENS_HOST") {
            config.host = host;
        }

        if let Some(port) = cli_args.port {
            config.port = port;
        } else if let Some(port) = env("CITIZENS_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("Invalid CITIZENS_PORT '{}'", port))?;
        }

        if let Some(max_size) = cli_args.max_request_size {
            config.max_request_size = max_size;
        } else if let Some(max_size) = env("CITIZENS_MAX_REQUEST_SIZE") {
            config.max_request_size = max_size
                .parse()
                .with_context(|| format!("Invalid CITIZENS_MAX_REQUEST_SIZE '{}'", max_size))?;
        }

        Ok(config)
    }

    /// Socket address to bind the listener to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_sources(&CliArgs::default(), env_of(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_request_size, 16 * 1024 * 1024);
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_env_applies_without_cli() {
        let env = env_of(&[
            ("CITIZENS_HOST", "127.0.0.1"),
            ("CITIZENS_PORT", "9090"),
            ("CITIZENS_MAX_REQUEST_SIZE", "2048"),
        ]);
        let config = ServerConfig::from_sources(&CliArgs::default(), env).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.max_request_size, 2048);
    }

    #[test]
    fn test_cli_overrides_env() {
        let cli = CliArgs {
            port: Some(7000),
            ..Default::default()
        };
        let config =
            ServerConfig::from_sources(&cli, env_of(&[("CITIZENS_PORT", "9090")])).unwrap();
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn test_invalid_env_is_an_error() {
        let result =
            ServerConfig::from_sources(&CliArgs::default(), env_of(&[("CITIZENS_PORT", "high")]));
        assert!(result.is_err());

        let config = ServerConfig {
            host: "not an address".to_string(),
            ..Default::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
