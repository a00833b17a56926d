//! In-memory citizen store

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use crate::graph::ValidatedBatch;
use crate::models::{Citizen, CitizenId, ImportId};
use crate::storage::errors::StorageError;
use crate::storage::models::CitizenCommit;
use crate::storage::traits::CitizenStore;

type ImportTable = BTreeMap<CitizenId, Citizen>;

#[derive(Debug)]
struct State {
    next_import: ImportId,
    imports: HashMap<ImportId, ImportTable>,
}

/// Store keeping every import in process memory.
///
/// A single lock guards all imports; each write builds its result on a copy of
/// the touched citizens and swaps it in only on success.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                next_import: 1,
                imports: HashMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CitizenStore for MemoryStore {
    async fn health_check(&self) -> Result<bool, StorageError> {
        Ok(true)
    }

    async fn get_metadata(&self) -> Result<serde_json::Value, StorageError> {
        let state = self.state.read().await;
        let citizens: usize = state.imports.values().map(|table| table.len()).sum();
        Ok(serde_json::json!({
            "type": "memory",
            "import_count": state.imports.len(),
            "citizen_count": citizens
        }))
    }

    async fn create_import(&self, batch: ValidatedBatch) -> Result<ImportId, StorageError> {
        let table: ImportTable = batch
            .citizens
            .into_iter()
            .map(|citizen| (citizen.citizen_id, citizen))
            .collect();

        let mut state = self.state.write().await;
        let import_id = state.next_import;
        state.next_import += 1;
        state.imports.insert(import_id, table);
        Ok(import_id)
    }

    async fn import_exists(&self, import_id: ImportId) -> Result<bool, StorageError> {
        Ok(self.state.read().await.imports.contains_key(&import_id))
    }

    async fn get_citizen(
        &self,
        import_id: ImportId,
        citizen_id: CitizenId,
    ) -> Result<Option<Citizen>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .imports
            .get(&import_id)
            .and_then(|table| table.get(&citizen_id))
            .cloned())
    }

    async fn list_citizens(
        &self,
        import_id: ImportId,
    ) -> Result<Option<Vec<Citizen>>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .imports
            .get(&import_id)
            .map(|table| table.values().cloned().collect()))
    }

    async fn find_existing(
        &self,
        import_id: ImportId,
        ids: &[CitizenId],
    ) -> Result<BTreeSet<CitizenId>, StorageError> {
        let state = self.state.read().await;
        let Some(table) = state.imports.get(&import_id) else {
            return Ok(BTreeSet::new());
        };
        Ok(ids
            .iter()
            .copied()
            .filter(|id| table.contains_key(id))
            .collect())
    }

    async fn commit_update(
        &self,
        import_id: ImportId,
        commit: CitizenCommit,
    ) -> Result<Citizen, StorageError> {
        let mut state = self.state.write().await;
        let table = state
            .imports
            .get_mut(&import_id)
            .ok_or_else(|| StorageError::NotFound(format!("import {}", import_id)))?;

        let mut working = HashMap::new();
        for id in commit.touched() {
            let citizen = table
                .get(&id)
                .ok_or_else(|| StorageError::NotFound(format!("citizen {}", id)))?;
            working.insert(id, citizen.clone());
        }

        let updated = commit.apply(&mut working)?;
        table.extend(working);
        Ok(updated)
    }
}
