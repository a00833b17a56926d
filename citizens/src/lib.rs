//! # Citizens
//!
//! Registry of citizen imports with a symmetric relative graph.
//!
//! A client submits a batch of citizens, each declaring the ids of its
//! relatives. The batch is accepted only if it forms a well-formed undirected
//! graph: unique ids, no dangling references, no duplicate relatives and every
//! relation declared from both ends. Accepted batches are stored under a fresh
//! import id. Individual citizens can later be patched; a new relative list is
//! reconciled against the stored one so that both endpoints of every added or
//! removed relation change together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use citizens::prelude::*;
//!
//! # async fn example(batch: Vec<CitizenRecord>) -> Result<()> {
//! let registry = citizens::init(ConfigBuilder::new().with_memory_storage().build()?).await?;
//!
//! let import_id = registry.add_import(batch).await?;
//! let report = registry.birthdays(import_id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`graph`]: batch validation and relative reconciliation
//! - [`storage`]: the `CitizenStore` collaborator with in-memory and RocksDB backends
//! - [`reports`]: birthday and age percentile aggregates
//! - [`core`]: the `RegistryService` tying the above together

pub mod config;
pub mod core;
pub mod graph;
pub mod logging;
pub mod models;
pub mod reports;
pub mod storage;

/// The prelude re-exports commonly used types for convenience
pub mod prelude {
    pub use crate::init;

    pub use crate::config::{ConfigBuilder, LogLevel, RegistryConfig, StorageBackend};

    pub use crate::core::RegistryService;

    pub use crate::models::{
        Citizen, CitizenId, CitizenRecord, CitizenUpdate, FieldPatch, Gender, ImportId,
    };

    pub use crate::reports::{BirthdayReport, Presents, TownAgeStats};

    pub use crate::storage::{CitizenStore, StorageError};

    pub use crate::{ErrorKind, RegistryError, Result};
}

use crate::models::{CitizenId, ImportId};

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The referenced import does not exist
    #[error("Cannot find import with id - {0}")]
    ImportNotFound(ImportId),

    /// The citizen does not exist in the referenced import
    #[error("Cannot find citizen with id - {0}")]
    CitizenNotFound(CitizenId),

    /// A declared relative is not part of the submitted batch
    #[error("Bad relatives for citizen with id - {citizen_id}. Not found citizen id - {relative_id}")]
    BadRelativesGiven {
        citizen_id: CitizenId,
        relative_id: CitizenId,
    },

    /// A relation is declared from one end only
    #[error(
        "Not symmetrical relatives given. {citizen_id} citizen has relative {relative_id} citizen. But {relative_id} citizen has not relative {citizen_id} citizen"
    )]
    NotSymmetricalRelatives {
        citizen_id: CitizenId,
        relative_id: CitizenId,
    },

    /// Some ids of a new relative list do not exist in the import
    #[error("Cannot find some citizens")]
    RelativesNotFound,

    /// Two batch records share a citizen id
    #[error("Not unique citizen_id into one data batch - {0}")]
    DuplicateCitizenId(CitizenId),

    /// A relative list names the same citizen twice
    #[error("Duplicate relatives ids given for citizen with id - {citizen_id}: {relative_id}")]
    DuplicateRelatives {
        citizen_id: CitizenId,
        relative_id: CitizenId,
    },

    /// The batch holds no citizens
    #[error("No citizens provided")]
    EmptyBatch,

    /// Any other malformed input
    #[error("{0}")]
    Validation(String),

    /// Error from the storage collaborator
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Internal,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::ImportNotFound(_)
            | RegistryError::CitizenNotFound(_)
            | RegistryError::RelativesNotFound => ErrorKind::NotFound,
            RegistryError::BadRelativesGiven { .. }
            | RegistryError::NotSymmetricalRelatives { .. }
            | RegistryError::DuplicateCitizenId(_)
            | RegistryError::DuplicateRelatives { .. }
            | RegistryError::EmptyBatch
            | RegistryError::Validation(_) => ErrorKind::BadRequest,
            RegistryError::Storage(_) | RegistryError::Configuration(_) => ErrorKind::Internal,
        }
    }
}

impl From<crate::config::ConfigError> for RegistryError {
    fn from(err: crate::config::ConfigError) -> Self {
        RegistryError::Configuration(err.to_string())
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Initialize the registry with the provided configuration
///
/// Opens the configured storage backend and returns a `RegistryService`.
/// Logging is left to the caller; see [`logging::init`].
///
/// # Examples
///
/// ```rust,no_run
/// use citizens::prelude::*;
///
/// async fn example() -> Result<()> {
///     let config = ConfigBuilder::new().with_memory_storage().build()?;
///     let registry = init(config).await?;
///     assert!(registry.health_check().await?);
///     Ok(())
/// }
/// ```
pub async fn init(config: config::RegistryConfig) -> Result<core::RegistryService> {
    let store = storage::create_store(&config.storage).await?;
    tracing::info!(backend = %config.storage.backend, "Citizen store ready");
    Ok(core::RegistryService::new(store))
}
