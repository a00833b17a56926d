//! Storage abstractions and implementations
//!
//! ## Storage Implementations
//!
//! - **MemoryStore**: process-local storage, the default, good for tests and
//!   short-lived deployments
//! - **RocksStore**: persistent storage under `data_dir` (cargo feature `rocksdb`)

pub mod errors;
pub mod memory;
pub mod models;
#[cfg(feature = "rocksdb")]
pub mod rocks;
pub mod traits;

pub use errors::StorageError;
pub use memory::MemoryStore;
pub use models::CitizenCommit;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksStore;
pub use traits::{CitizenLookup, CitizenStore};

#[cfg(test)]
pub use traits::MockCitizenStore;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Create a citizen store from configuration
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn CitizenStore>, StorageError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Creating in-memory citizen store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::RocksDb => open_rocks(config),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocks(config: &StorageConfig) -> Result<Arc<dyn CitizenStore>, StorageError> {
    let path = config.data_dir.join("citizens");
    std::fs::create_dir_all(&path)?;
    tracing::info!(path = %path.display(), "Opening RocksDB citizen store");
    Ok(Arc::new(RocksStore::open(&path)?))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocks(_config: &StorageConfig) -> Result<Arc<dyn CitizenStore>, StorageError> {
    Err(StorageError::UnsupportedStorageType(
        "rocksdb (rebuild with the `rocksdb` feature)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_store() {
        let config = StorageConfig::default();
        let store = create_store(&config).await.unwrap();

        assert!(store.health_check().await.unwrap());
        let metadata = store.get_metadata().await.unwrap();
        assert_eq!(metadata["type"], "memory");
    }

    #[cfg(not(feature = "rocksdb"))]
    #[tokio::test]
    async fn test_rocksdb_requires_feature() {
        let config = StorageConfig {
            backend: StorageBackend::RocksDb,
            ..Default::default()
        };
        let result = create_store(&config).await;
        assert!(matches!(result, Err(StorageError::UnsupportedStorageType(_))));
    }

    #[cfg(feature = "rocksdb")]
    #[tokio::test]
    async fn test_create_rocksdb_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::RocksDb,
            data_dir: dir.path().to_path_buf(),
        };
        let store = create_store(&config).await.unwrap();
        assert!(store.health_check().await.unwrap());
    }
}
