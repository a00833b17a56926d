//! Write units handed to the store

use std::collections::HashMap;

use crate::graph::EdgeDelta;
use crate::models::{Citizen, CitizenId, CitizenUpdate};
use crate::storage::errors::StorageError;

/// Everything one citizen update writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitizenCommit {
    pub citizen_id: CitizenId,
    pub update: CitizenUpdate,
    pub edges: Option<EdgeDelta>,
}

impl CitizenCommit {
    /// Ids of every citizen the commit writes, the subject first.
    pub fn touched(&self) -> Vec<CitizenId> {
        let mut ids = vec![self.citizen_id];
        if let Some(delta) = &self.edges {
            ids.extend(delta.touched().into_iter().filter(|id| *id != self.citizen_id));
        }
        ids
    }

    /// Apply the commit to a working set holding every touched citizen and
    /// return the updated subject.
    pub fn apply(
        &self,
        working: &mut HashMap<CitizenId, Citizen>,
    ) -> Result<Citizen, StorageError> {
        let subject = working.get_mut(&self.citizen_id).ok_or_else(|| {
            StorageError::NotFound(format!("citizen {}", self.citizen_id))
        })?;
        self.update.apply_to(subject);

        if let Some(delta) = &self.edges {
            delta
                .apply_links(working)
                .map_err(|id| StorageError::NotFound(format!("citizen {}", id)))?;
        }

        working
            .get(&self.citizen_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("citizen {}", self.citizen_id)))
    }
}
