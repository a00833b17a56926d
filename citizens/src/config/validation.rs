//! Configuration validation utilities.

use super::ConfigError;
use super::models::*;

/// Validate the entire configuration.
pub fn validate_config(config: &RegistryConfig) -> Result<(), ConfigError> {
    validate_storage_config(&config.storage)?;
    validate_logging_config(&config.logging)?;

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.backend == StorageBackend::RocksDb && config.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Data directory cannot be empty for rocksdb storage".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if !config.stdout && config.file.is_none() {
        return Err(ConfigError::ValidationError(
            "Logging needs stdout or a log file".to_string(),
        ));
    }

    if let Some(file) = &config.file
        && file.file_name().is_none()
    {
        return Err(ConfigError::ValidationError(format!(
            "Log file path has no file name: {}",
            file.display()
        )));
    }

    Ok(())
}
