//! Persistent citizen store using RocksDB.
//!
//! Key layout:
//!
//! - `meta:next_import` holds the next import id
//! - `import:{import}` marks an import and holds its citizen count
//! - `citizen:{import}:{citizen}` holds one citizen as JSON
//!
//! Ids are zero-padded so that a prefix scan over `citizen:{import}:` yields
//! citizens in ascending id order.

use async_trait::async_trait;
use rocksdb::{DB, Options, WriteBatch};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::graph::ValidatedBatch;
use crate::models::{Citizen, CitizenId, ImportId};
use crate::storage::errors::StorageError;
use crate::storage::models::CitizenCommit;
use crate::storage::traits::CitizenStore;

const NEXT_IMPORT_KEY: &[u8] = b"meta:next_import";

fn import_key(import_id: ImportId) -> String {
    format!("import:{:020}", import_id)
}

fn citizen_prefix(import_id: ImportId) -> String {
    format!("citizen:{:020}:", import_id)
}

fn citizen_key(import_id: ImportId, citizen_id: CitizenId) -> String {
    format!("citizen:{:020}:{:020}", import_id, citizen_id)
}

/// Store backed by a RocksDB database on disk.
///
/// Point reads go straight to the database. Writes are serialized by
/// `write_lock`, run on the blocking pool and land as a single `WriteBatch`.
pub struct RocksStore {
    db: Arc<DB>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.db.path())
            .finish()
    }
}

impl RocksStore {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)
            .map_err(|e| StorageError::Connection(format!("Failed to open RocksDB: {}", e)))?;
        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Run `task` against the database on tokio's blocking pool.
    async fn blocking<T, F>(&self, task: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&DB) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || task(&db))
            .await
            .map_err(|e| StorageError::Backend(format!("Storage task failed: {}", e)))?
    }
}

fn decode_citizen(citizen_id: CitizenId, data: &[u8]) -> Result<Citizen, StorageError> {
    let citizen: Citizen = serde_json::from_slice(data)?;
    if citizen.citizen_id != citizen_id {
        return Err(StorageError::Corrupted(format!(
            "key holds citizen {} but record has citizen_id {}",
            citizen_id, citizen.citizen_id
        )));
    }
    Ok(citizen)
}

/// Citizen id encoded in the tail of a `citizen:{import}:{citizen}` key.
fn key_citizen_id(key: &[u8]) -> Result<CitizenId, StorageError> {
    std::str::from_utf8(key)
        .ok()
        .and_then(|key| key.rsplit(':').next())
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| {
            StorageError::Corrupted(format!(
                "malformed citizen key {}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn read_citizen(
    db: &DB,
    import_id: ImportId,
    citizen_id: CitizenId,
) -> Result<Option<Citizen>, StorageError> {
    match db.get(citizen_key(import_id, citizen_id).as_bytes())? {
        Some(data) => Ok(Some(decode_citizen(citizen_id, &data)?)),
        None => Ok(None),
    }
}

fn next_import_id(db: &DB) -> Result<ImportId, StorageError> {
    match db.get(NEXT_IMPORT_KEY)? {
        Some(data) => Ok(serde_json::from_slice(&data)?),
        None => Ok(1),
    }
}

fn has_import(db: &DB, import_id: ImportId) -> Result<bool, StorageError> {
    Ok(db.get(import_key(import_id).as_bytes())?.is_some())
}

fn write_import(db: &DB, batch: &ValidatedBatch) -> Result<ImportId, StorageError> {
    let import_id = next_import_id(db)?;

    let mut write = WriteBatch::default();
    write.put(NEXT_IMPORT_KEY, serde_json::to_vec(&(import_id + 1))?);
    write.put(
        import_key(import_id).as_bytes(),
        serde_json::to_vec(&batch.citizens.len())?,
    );
    for citizen in &batch.citizens {
        write.put(
            citizen_key(import_id, citizen.citizen_id).as_bytes(),
            serde_json::to_vec(citizen)?,
        );
    }
    db.write(write)?;

    Ok(import_id)
}

fn write_commit(
    db: &DB,
    import_id: ImportId,
    commit: &CitizenCommit,
) -> Result<Citizen, StorageError> {
    if !has_import(db, import_id)? {
        return Err(StorageError::NotFound(format!("import {}", import_id)));
    }

    let mut working = HashMap::new();
    for id in commit.touched() {
        let citizen = read_citizen(db, import_id, id)?
            .ok_or_else(|| StorageError::NotFound(format!("citizen {}", id)))?;
        working.insert(id, citizen);
    }

    let updated = commit.apply(&mut working)?;

    let mut write = WriteBatch::default();
    for (id, citizen) in &working {
        write.put(citizen_key(import_id, *id).as_bytes(), serde_json::to_vec(citizen)?);
    }
    db.write(write)?;

    Ok(updated)
}

#[async_trait]
impl CitizenStore for RocksStore {
    async fn health_check(&self) -> Result<bool, StorageError> {
        self.db.get(NEXT_IMPORT_KEY)?;
        Ok(true)
    }

    async fn get_metadata(&self) -> Result<serde_json::Value, StorageError> {
        let next_import = next_import_id(&self.db)?;
        Ok(serde_json::json!({
            "type": "rocksdb",
            "path": self.db.path().display().to_string(),
            "import_count": next_import - 1
        }))
    }

    async fn create_import(&self, batch: ValidatedBatch) -> Result<ImportId, StorageError> {
        let _guard = self.write_lock.lock().await;
        let citizens = batch.citizens.len();
        let import_id = self.blocking(move |db| write_import(db, &batch)).await?;

        tracing::debug!(import_id, citizens, "Import written");
        Ok(import_id)
    }

    async fn import_exists(&self, import_id: ImportId) -> Result<bool, StorageError> {
        has_import(&self.db, import_id)
    }

    async fn get_citizen(
        &self,
        import_id: ImportId,
        citizen_id: CitizenId,
    ) -> Result<Option<Citizen>, StorageError> {
        read_citizen(&self.db, import_id, citizen_id)
    }

    async fn list_citizens(
        &self,
        import_id: ImportId,
    ) -> Result<Option<Vec<Citizen>>, StorageError> {
        self.blocking(move |db| {
            if !has_import(db, import_id)? {
                return Ok(None);
            }

            let prefix = citizen_prefix(import_id);
            let mut citizens = Vec::new();
            for item in db.prefix_iterator(prefix.as_bytes()) {
                let (key, value) = item?;
                if !key.starts_with(prefix.as_bytes()) {
                    break;
                }
                citizens.push(decode_citizen(key_citizen_id(&key)?, &value)?);
            }
            Ok(Some(citizens))
        })
        .await
    }

    async fn find_existing(
        &self,
        import_id: ImportId,
        ids: &[CitizenId],
    ) -> Result<BTreeSet<CitizenId>, StorageError> {
        let mut found = BTreeSet::new();
        for id in ids {
            if self.db.get(citizen_key(import_id, *id).as_bytes())?.is_some() {
                found.insert(*id);
            }
        }
        Ok(found)
    }

    async fn commit_update(
        &self,
        import_id: ImportId,
        commit: CitizenCommit,
    ) -> Result<Citizen, StorageError> {
        let _guard = self.write_lock.lock().await;
        self.blocking(move |db| write_commit(db, import_id, &commit))
            .await
    }
}
