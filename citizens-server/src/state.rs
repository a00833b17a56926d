//! Application state management

use citizens::core::RegistryService;

use crate::config::ServerConfig;

/// Application state shared across all handlers
#[derive(Debug)]
pub struct AppState {
    /// Citizen registry
    pub registry: RegistryService,

    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create new application state
    pub fn new(registry: RegistryService, config: ServerConfig) -> Self {
        Self { registry, config }
    }
}
