//! Per-import writer locks.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::ImportId;

/// Serializes read-modify-write sequences within one import.
///
/// Writers of different imports never wait on each other. Readers take no
/// lock at all. An import's entry lives only while some writer holds or
/// waits for it.
#[derive(Debug, Default)]
pub struct ImportLocks {
    locks: DashMap<ImportId, Arc<Mutex<()>>>,
}

/// Exclusive write access to one import, released on drop.
#[derive(Debug)]
pub struct ImportWriteGuard<'a> {
    locks: &'a ImportLocks,
    import_id: ImportId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ImportWriteGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's reference left: nobody holds or waits on this lock.
        self.locks
            .locks
            .remove_if(&self.import_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl ImportLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to an import.
    pub async fn acquire(&self, import_id: ImportId) -> ImportWriteGuard<'_> {
        let lock = self
            .locks
            .entry(import_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        ImportWriteGuard {
            locks: self,
            import_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of imports with a writer holding or awaiting the lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
