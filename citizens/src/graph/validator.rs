//! Batch-level validation of the relative graph.
//!
//! A batch is accepted only when its declared relations form a proper
//! undirected graph. Checks run one after another over the whole batch, each in
//! submission order, and the first violation is returned.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::models::{Citizen, CitizenId, CitizenRecord, EdgeMap};
use crate::{RegistryError, Result};

/// A batch that passed graph validation, ready to be persisted as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    /// Citizens in submission order, `relatives` filled from `edges`
    pub citizens: Vec<Citizen>,

    /// Symmetric adjacency of the batch
    pub edges: EdgeMap,
}

impl ValidatedBatch {
    /// Number of undirected relations, counting a self-relation once.
    pub fn relation_count(&self) -> usize {
        self.edges
            .iter()
            .flat_map(|(id, relatives)| relatives.iter().map(move |rel| (*id, *rel)))
            .filter(|(id, rel)| id <= rel)
            .count()
    }
}

/// Validates submitted batches before anything is stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationGraphValidator;

impl RelationGraphValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a batch and build its edge map.
    ///
    /// # Errors
    ///
    /// - `EmptyBatch` when there is nothing to import
    /// - `DuplicateCitizenId` when two records share an id
    /// - `BadRelativesGiven` when a relative is not in the batch
    /// - `DuplicateRelatives` when one record lists a relative twice
    /// - `NotSymmetricalRelatives` when a relation is declared from one end only
    pub fn validate(&self, batch: Vec<CitizenRecord>) -> Result<ValidatedBatch> {
        let result = Self::check(&batch);
        if let Err(e) = &result {
            debug!(error = %e, citizens = batch.len(), "Batch rejected");
        }
        let edges = result?;

        let citizens = batch
            .into_iter()
            .map(|record| {
                let relatives = edges.get(&record.citizen_id).cloned().unwrap_or_default();
                record.into_citizen(relatives)
            })
            .collect();

        Ok(ValidatedBatch { citizens, edges })
    }

    fn check(batch: &[CitizenRecord]) -> Result<EdgeMap> {
        if batch.is_empty() {
            return Err(RegistryError::EmptyBatch);
        }

        let mut ids: HashSet<CitizenId> = HashSet::with_capacity(batch.len());
        for record in batch {
            if !ids.insert(record.citizen_id) {
                return Err(RegistryError::DuplicateCitizenId(record.citizen_id));
            }
        }

        for record in batch {
            if let Some(missing) = record.relatives.iter().find(|rel| !ids.contains(rel)) {
                return Err(RegistryError::BadRelativesGiven {
                    citizen_id: record.citizen_id,
                    relative_id: *missing,
                });
            }
        }

        let mut edges = EdgeMap::new();
        for record in batch {
            let mut relatives = BTreeSet::new();
            for rel in &record.relatives {
                if !relatives.insert(*rel) {
                    return Err(RegistryError::DuplicateRelatives {
                        citizen_id: record.citizen_id,
                        relative_id: *rel,
                    });
                }
            }
            edges.insert(record.citizen_id, relatives);
        }

        for record in batch {
            for rel in &record.relatives {
                let declared_back = edges
                    .get(rel)
                    .is_some_and(|back| back.contains(&record.citizen_id));
                if !declared_back {
                    return Err(RegistryError::NotSymmetricalRelatives {
                        citizen_id: record.citizen_id,
                        relative_id: *rel,
                    });
                }
            }
        }

        Ok(edges)
    }
}
