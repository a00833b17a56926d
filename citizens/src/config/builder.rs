//! Configuration builder.

use super::{Result, models::*, validation};
use std::path::Path;

/// Builder for creating RegistryConfig instances.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: RegistryConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
        }
    }

    /// Set the base data directory.
    pub fn with_data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.storage.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Keep imports in process memory.
    pub fn with_memory_storage(mut self) -> Self {
        self.config.storage.backend = StorageBackend::Memory;
        self
    }

    /// Persist imports in RocksDB under the data directory.
    pub fn with_rocksdb_storage(mut self) -> Self {
        self.config.storage.backend = StorageBackend::RocksDb;
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set the log format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    /// Configure logging to a file.
    pub fn with_log_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.logging.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Create a configuration for development: in-memory storage and debug logs.
    pub fn development() -> Self {
        Self::new()
            .with_memory_storage()
            .with_log_level(LogLevel::Debug)
    }

    /// Create a production configuration: RocksDB storage and JSON logs.
    pub fn production() -> Self {
        Self::new()
            .with_rocksdb_storage()
            .with_log_level(LogLevel::Info)
            .with_log_format(LogFormat::Json)
    }

    /// Build the configuration, validating it in the process.
    pub fn build(self) -> Result<RegistryConfig> {
        validation::validate_config(&self.config)?;

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
