//! Registry service for Citizens
//!
//! `RegistryService` is the primary interface to imports. It validates
//! incoming batches, reconciles relative lists on update and computes reports,
//! delegating persistence to a [`CitizenStore`].

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::locks::ImportLocks;
use crate::graph::{RelationGraphValidator, RelativeEdgeReconciler};
use crate::models::{Citizen, CitizenId, CitizenRecord, CitizenUpdate, ImportId};
use crate::reports::{self, BirthdayReport, TownAgeStats};
use crate::storage::{CitizenCommit, CitizenStore};
use crate::{RegistryError, Result};

/// Primary interface for imports and citizens.
///
/// Cheap to clone; clones share the store and the writer locks.
#[derive(Debug, Clone)]
pub struct RegistryService {
    store: Arc<dyn CitizenStore>,
    validator: RelationGraphValidator,
    locks: Arc<ImportLocks>,
}

impl RegistryService {
    /// Create a service over the given store
    pub fn new(store: Arc<dyn CitizenStore>) -> Self {
        Self {
            store,
            validator: RelationGraphValidator::new(),
            locks: Arc::new(ImportLocks::new()),
        }
    }

    /// Access the underlying store
    pub fn store(&self) -> &Arc<dyn CitizenStore> {
        &self.store
    }

    /// Check if the storage is healthy
    pub async fn health_check(&self) -> Result<bool> {
        Ok(self.store.health_check().await?)
    }

    /// Validate a batch and store it under a new import id.
    ///
    /// Nothing is written when validation fails.
    pub async fn add_import(&self, batch: Vec<CitizenRecord>) -> Result<ImportId> {
        let size = batch.len();
        let validated = self.validator.validate(batch)?;
        let relations = validated.relation_count();

        let import_id = self
            .store
            .create_import(validated)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to store import"))?;

        info!(import_id, citizens = size, relations, "Import created");
        Ok(import_id)
    }

    /// Apply a partial update to one citizen.
    ///
    /// `relatives`, when given, replaces the citizen's relative list; the
    /// reverse links of every added or removed relative change in the same
    /// commit.
    pub async fn update_citizen(
        &self,
        import_id: ImportId,
        citizen_id: CitizenId,
        update: CitizenUpdate,
        relatives: Option<Vec<CitizenId>>,
    ) -> Result<Citizen> {
        if update.is_empty() && relatives.is_none() {
            return Err(RegistryError::Validation(
                "No one field is provided. Must be at least one".to_string(),
            ));
        }

        if !self.store.import_exists(import_id).await? {
            return Err(RegistryError::ImportNotFound(import_id));
        }

        let _guard = self.locks.acquire(import_id).await;

        let current = self
            .store
            .get_citizen(import_id, citizen_id)
            .await?
            .ok_or(RegistryError::CitizenNotFound(citizen_id))?;

        let edges = RelativeEdgeReconciler::new(self.store.as_ref())
            .reconcile(import_id, citizen_id, &current.relatives, relatives.as_deref())
            .await?;

        let commit = CitizenCommit {
            citizen_id,
            update,
            edges,
        };
        let updated = self
            .store
            .commit_update(import_id, commit)
            .await
            .inspect_err(|e| warn!(import_id, citizen_id, error = %e, "Failed to commit update"))?;

        debug!(import_id, citizen_id, "Citizen updated");
        Ok(updated)
    }

    /// All citizens of an import ordered by id.
    pub async fn list_citizens(&self, import_id: ImportId) -> Result<Vec<Citizen>> {
        self.store
            .list_citizens(import_id)
            .await?
            .ok_or(RegistryError::ImportNotFound(import_id))
    }

    /// Presents each citizen buys per month.
    pub async fn birthdays(&self, import_id: ImportId) -> Result<BirthdayReport> {
        let citizens = self.list_citizens(import_id).await?;
        Ok(reports::relatives_birthdays(&citizens))
    }

    /// Age percentiles per town as of today (UTC).
    pub async fn age_percentiles(&self, import_id: ImportId) -> Result<Vec<TownAgeStats>> {
        self.age_percentiles_at(import_id, Utc::now().date_naive())
            .await
    }

    /// Age percentiles per town as of `today`.
    pub async fn age_percentiles_at(
        &self,
        import_id: ImportId,
        today: NaiveDate,
    ) -> Result<Vec<TownAgeStats>> {
        let citizens = self.list_citizens(import_id).await?;
        Ok(reports::town_age_percentiles(&citizens, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::storage::{MemoryStore, MockCitizenStore};
    use std::collections::BTreeSet;

    fn stored(citizen_id: CitizenId, relatives: &[CitizenId]) -> Citizen {
        Citizen {
            citizen_id,
            town: "Moscow".to_string(),
            street: "Tverskaya".to_string(),
            building: "3".to_string(),
            apartment: 12,
            name: format!("Citizen {}", citizen_id),
            birth_date: NaiveDate::from_ymd_opt(1985, 8, 15).unwrap(),
            gender: Gender::Male,
            relatives: relatives.iter().copied().collect(),
        }
    }

    fn record(citizen_id: CitizenId, relatives: &[CitizenId]) -> CitizenRecord {
        CitizenRecord {
            citizen_id,
            town: "Moscow".to_string(),
            street: "Tverskaya".to_string(),
            building: "3".to_string(),
            apartment: 12,
            name: format!("Citizen {}", citizen_id),
            birth_date: NaiveDate::from_ymd_opt(1985, 8, 15).unwrap(),
            gender: Gender::Male,
            relatives: relatives.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_unknown_relative_never_reaches_commit() {
        let mut store = MockCitizenStore::new();
        store.expect_import_exists().returning(|_| Ok(true));
        store
            .expect_get_citizen()
            .returning(|_, id| Ok(Some(stored(id, &[2]))));
        store
            .expect_find_existing()
            .returning(|_, ids| Ok(ids.iter().copied().filter(|id| *id == 2).collect()));
        store.expect_commit_update().never();

        let service = RegistryService::new(Arc::new(store));
        let err = service
            .update_citizen(1, 1, CitizenUpdate::default(), Some(vec![2, 999999]))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::RelativesNotFound));
    }

    #[tokio::test]
    async fn test_invalid_batch_never_reaches_store() {
        let mut store = MockCitizenStore::new();
        store.expect_create_import().never();

        let service = RegistryService::new(Arc::new(store));
        let err = service
            .add_import(vec![record(1, &[2]), record(2, &[])])
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::NotSymmetricalRelatives { .. }));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected_before_lookup() {
        let mut store = MockCitizenStore::new();
        store.expect_import_exists().never();

        let service = RegistryService::new(Arc::new(store));
        let err = service
            .update_citizen(1, 1, CitizenUpdate::default(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_import_and_citizen() {
        let service = RegistryService::new(Arc::new(MemoryStore::new()));
        let update = CitizenUpdate {
            name: Some("New".to_string()),
            ..Default::default()
        };

        let err = service
            .update_citizen(7, 1, update.clone(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::ImportNotFound(7)));

        let import_id = service.add_import(vec![record(1, &[])]).await.unwrap();
        let err = service
            .update_citizen(import_id, 2, update, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::CitizenNotFound(2)));

        assert!(matches!(
            service.list_citizens(99).await,
            Err(RegistryError::ImportNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_update_scalars_and_relatives() {
        let service = RegistryService::new(Arc::new(MemoryStore::new()));
        let import_id = service
            .add_import(vec![record(1, &[2, 3]), record(2, &[1]), record(3, &[1])])
            .await
            .unwrap();

        let update = CitizenUpdate {
            street: Some("Arbat".to_string()),
            ..Default::default()
        };
        let updated = service
            .update_citizen(import_id, 1, update, Some(vec![2]))
            .await
            .unwrap();

        assert_eq!(updated.street, "Arbat");
        assert_eq!(updated.relatives, BTreeSet::from([2]));

        let citizens = service.list_citizens(import_id).await.unwrap();
        assert_eq!(citizens[1].relatives, BTreeSet::from([1]));
        assert!(citizens[2].relatives.is_empty());
    }
}
