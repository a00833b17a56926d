//! Configuration system for the registry.
//!
//! Configuration is layered: built-in defaults, then an optional file, then
//! environment variables. Everything is validated before use.

mod builder;
mod loader;
mod models;
#[cfg(test)]
mod tests;
mod validation;

pub use builder::ConfigBuilder;
pub use loader::ConfigLoader;
pub use models::*;

/// Default configuration file names that the system will look for
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "citizens.toml",
    "citizens.yaml",
    "citizens.yml",
    "citizens.json",
];

/// Environment variable prefix for registry configuration
pub const ENV_PREFIX: &str = "CITIZENS_";

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error occurred during file loading
    #[error("Failed to load configuration file: {0}")]
    FileLoadError(String),

    /// Error occurred during validation
    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    /// Error occurred during parsing
    #[error("Configuration parsing error: {0}")]
    ParseError(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
