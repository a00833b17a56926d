//! Storage trait definitions

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::graph::ValidatedBatch;
use crate::models::{Citizen, CitizenId, ImportId};
use crate::storage::errors::StorageError;
use crate::storage::models::CitizenCommit;

/// Read-only id resolution used while reconciling relatives.
#[async_trait]
pub trait CitizenLookup: Send + Sync {
    /// Return the subset of `ids` that exist in the import.
    async fn existing_citizens(
        &self,
        import_id: ImportId,
        ids: &[CitizenId],
    ) -> std::result::Result<BTreeSet<CitizenId>, StorageError>;
}

/// Persistence collaborator for imports and citizens.
///
/// Implementations must make `create_import` and `commit_update` atomic: either
/// every record or link write of the call becomes visible or none does.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CitizenStore: Send + Sync + 'static + Debug {
    /// Check if the storage is healthy
    async fn health_check(&self) -> std::result::Result<bool, StorageError>;

    /// Get storage metadata
    async fn get_metadata(&self) -> std::result::Result<serde_json::Value, StorageError>;

    /// Persist a validated batch under a freshly allocated import id.
    async fn create_import(
        &self,
        batch: ValidatedBatch,
    ) -> std::result::Result<ImportId, StorageError>;

    async fn import_exists(&self, import_id: ImportId) -> std::result::Result<bool, StorageError>;

    async fn get_citizen(
        &self,
        import_id: ImportId,
        citizen_id: CitizenId,
    ) -> std::result::Result<Option<Citizen>, StorageError>;

    /// All citizens of an import ordered by id, or `None` for an unknown import.
    async fn list_citizens(
        &self,
        import_id: ImportId,
    ) -> std::result::Result<Option<Vec<Citizen>>, StorageError>;

    /// Return the subset of `ids` that exist in the import.
    async fn find_existing(
        &self,
        import_id: ImportId,
        ids: &[CitizenId],
    ) -> std::result::Result<BTreeSet<CitizenId>, StorageError>;

    /// Apply a scalar update and a relative delta as one unit and return the
    /// updated citizen.
    async fn commit_update(
        &self,
        import_id: ImportId,
        commit: CitizenCommit,
    ) -> std::result::Result<Citizen, StorageError>;
}

#[async_trait]
impl<T> CitizenLookup for T
where
    T: CitizenStore + ?Sized,
{
    async fn existing_citizens(
        &self,
        import_id: ImportId,
        ids: &[CitizenId],
    ) -> std::result::Result<BTreeSet<CitizenId>, StorageError> {
        self.find_existing(import_id, ids).await
    }
}
