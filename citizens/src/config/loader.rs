//! Layered loading of [`RegistryConfig`].
//!
//! Layers merge in call order, later ones winning: built-in defaults, then one
//! config file, then `CITIZENS_*` environment variables.

use super::{ConfigError, DEFAULT_CONFIG_FILES, ENV_PREFIX, Result, models::*, validation};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use std::path::{Path, PathBuf};

const FILE_EXTENSIONS: [&str; 4] = ["toml", "yaml", "yml", "json"];

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    figment: Figment,
}

impl ConfigLoader {
    /// Loader seeded with `RegistryConfig::default()`.
    pub fn new() -> Self {
        Self {
            figment: Figment::new().merge(Serialized::defaults(RegistryConfig::default())),
        }
    }

    /// Merge a config file, picking the format from its extension.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileLoadError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let figment = self.figment.clone();
        self.figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => {
                return Err(ConfigError::FileLoadError(format!(
                    "Unsupported file format: {}",
                    path.display()
                )));
            }
        };
        Ok(self)
    }

    /// Merge the first config file found in the working directory, or failing
    /// that in the user's config directory. Finding none is not an error.
    pub fn load_default_files(&mut self) -> &mut Self {
        let user_files = directories::ProjectDirs::from("org", "citizens", "citizens")
            .map(|dirs| {
                FILE_EXTENSIONS
                    .iter()
                    .map(|ext| dirs.config_dir().join(format!("config.{}", ext)))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let candidates = DEFAULT_CONFIG_FILES
            .iter()
            .map(|file| PathBuf::from(*file))
            .chain(user_files);
        for path in candidates {
            if path.is_file() && self.load_file(&path).is_ok() {
                tracing::debug!(path = %path.display(), "Loaded config file");
                break;
            }
        }
        self
    }

    /// Merge `CITIZENS_*` variables; `__` separates nested keys, so
    /// `CITIZENS_STORAGE__BACKEND=rocksdb` sets `storage.backend`.
    pub fn load_env(&mut self) -> &mut Self {
        self.figment = self
            .figment
            .clone()
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        self
    }

    /// Extract the merged layers and validate the result.
    pub fn extract(&self) -> Result<RegistryConfig> {
        let config: RegistryConfig = self
            .figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
