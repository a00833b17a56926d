//! Relative list reconciliation for single-citizen updates.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::models::{Citizen, CitizenId, ImportId};
use crate::storage::CitizenLookup;
use crate::{RegistryError, Result};

/// Whether a directed link is inserted or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkChange {
    Insert,
    Remove,
}

/// One side of an undirected relation: `to` is added to or removed from the
/// relatives of `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectedLink {
    pub from: CitizenId,
    pub to: CitizenId,
    pub change: LinkChange,
}

/// Difference between a citizen's stored relatives and a requested list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeDelta {
    pub subject: CitizenId,
    pub to_add: BTreeSet<CitizenId>,
    pub to_remove: BTreeSet<CitizenId>,
}

impl EdgeDelta {
    /// Compute the delta turning `current` into `desired`.
    pub fn between(
        subject: CitizenId,
        current: &BTreeSet<CitizenId>,
        desired: &BTreeSet<CitizenId>,
    ) -> Self {
        Self {
            subject,
            to_add: desired.difference(current).copied().collect(),
            to_remove: current.difference(desired).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Every citizen whose relatives change, the subject included.
    pub fn touched(&self) -> BTreeSet<CitizenId> {
        let mut ids: BTreeSet<CitizenId> = self.to_add.union(&self.to_remove).copied().collect();
        ids.insert(self.subject);
        ids
    }

    /// Expand the delta into directed link writes.
    ///
    /// Every added or removed relation yields both directions. A self-relation
    /// is a single link.
    pub fn directed_links(&self) -> Vec<DirectedLink> {
        let mut links = Vec::with_capacity(2 * (self.to_add.len() + self.to_remove.len()));
        let changes = self
            .to_add
            .iter()
            .map(|id| (*id, LinkChange::Insert))
            .chain(self.to_remove.iter().map(|id| (*id, LinkChange::Remove)));

        for (other, change) in changes {
            links.push(DirectedLink {
                from: self.subject,
                to: other,
                change,
            });
            if other != self.subject {
                links.push(DirectedLink {
                    from: other,
                    to: self.subject,
                    change,
                });
            }
        }
        links
    }

    /// Apply every directed link to a working set of citizens.
    ///
    /// Fails with the id of the first citizen missing from `citizens`; the map
    /// may be partially modified in that case and must be discarded.
    pub fn apply_links(
        &self,
        citizens: &mut HashMap<CitizenId, Citizen>,
    ) -> std::result::Result<(), CitizenId> {
        for link in self.directed_links() {
            let citizen = citizens.get_mut(&link.from).ok_or(link.from)?;
            match link.change {
                LinkChange::Insert => citizen.relatives.insert(link.to),
                LinkChange::Remove => citizen.relatives.remove(&link.to),
            };
        }
        Ok(())
    }
}

/// Turns a requested relative list into an [`EdgeDelta`].
///
/// Resolution of ids goes through a [`CitizenLookup`] so the reconciler never
/// writes anything itself.
#[derive(Debug)]
pub struct RelativeEdgeReconciler<'a, L: CitizenLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: CitizenLookup + ?Sized> RelativeEdgeReconciler<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Reconcile `desired` against the subject's `current` relatives.
    ///
    /// Returns `Ok(None)` when no relative list was requested. Otherwise every
    /// requested id must exist in the import (the subject always does).
    ///
    /// # Errors
    ///
    /// - `DuplicateRelatives` when `desired` names an id twice
    /// - `RelativesNotFound` when any requested id is not in the import
    pub async fn reconcile(
        &self,
        import_id: ImportId,
        subject: CitizenId,
        current: &BTreeSet<CitizenId>,
        desired: Option<&[CitizenId]>,
    ) -> Result<Option<EdgeDelta>> {
        let Some(desired) = desired else {
            return Ok(None);
        };

        let mut wanted = BTreeSet::new();
        for id in desired {
            if !wanted.insert(*id) {
                return Err(RegistryError::DuplicateRelatives {
                    citizen_id: subject,
                    relative_id: *id,
                });
            }
        }

        let lookup_ids: Vec<CitizenId> = wanted.iter().copied().filter(|id| *id != subject).collect();
        if !lookup_ids.is_empty() {
            let found = self.lookup.existing_citizens(import_id, &lookup_ids).await?;
            if let Some(missing) = lookup_ids.iter().find(|id| !found.contains(id)) {
                debug!(import_id, subject, missing, "Requested relative does not exist");
                return Err(RegistryError::RelativesNotFound);
            }
        }

        let delta = EdgeDelta::between(subject, current, &wanted);
        debug!(
            import_id,
            subject,
            added = delta.to_add.len(),
            removed = delta.to_remove.len(),
            "Relatives reconciled"
        );
        Ok(Some(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RelationGraphValidator;
    use crate::models::{CitizenRecord, Gender};
    use crate::storage::{CitizenStore, MemoryStore};
    use chrono::NaiveDate;

    fn set(ids: &[CitizenId]) -> BTreeSet<CitizenId> {
        ids.iter().copied().collect()
    }

    fn record(citizen_id: CitizenId, relatives: &[CitizenId]) -> CitizenRecord {
        CitizenRecord {
            citizen_id,
            town: "Kazan".to_string(),
            street: "Baumana".to_string(),
            building: "1".to_string(),
            apartment: citizen_id,
            name: format!("Citizen {}", citizen_id),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            gender: Gender::Male,
            relatives: relatives.to_vec(),
        }
    }

    async fn seeded_store() -> (MemoryStore, ImportId) {
        let store = MemoryStore::new();
        let batch = RelationGraphValidator::new()
            .validate(vec![
                record(1, &[2]),
                record(2, &[1]),
                record(3, &[]),
                record(4, &[]),
            ])
            .unwrap();
        let import_id = store.create_import(batch).await.unwrap();
        (store, import_id)
    }

    #[test]
    fn test_delta_between_sets() {
        let delta = EdgeDelta::between(1, &set(&[2, 3]), &set(&[3, 4]));
        assert_eq!(delta.to_add, set(&[4]));
        assert_eq!(delta.to_remove, set(&[2]));
        assert_eq!(delta.touched(), set(&[1, 2, 4]));
        assert!(!delta.is_empty());
        assert!(EdgeDelta::between(1, &set(&[2]), &set(&[2])).is_empty());
    }

    #[test]
    fn test_directed_links_cover_both_ends() {
        let delta = EdgeDelta::between(1, &set(&[2]), &set(&[3]));
        let links = delta.directed_links();

        assert_eq!(links.len(), 4);
        assert!(links.contains(&DirectedLink { from: 1, to: 3, change: LinkChange::Insert }));
        assert!(links.contains(&DirectedLink { from: 3, to: 1, change: LinkChange::Insert }));
        assert!(links.contains(&DirectedLink { from: 1, to: 2, change: LinkChange::Remove }));
        assert!(links.contains(&DirectedLink { from: 2, to: 1, change: LinkChange::Remove }));
    }

    #[test]
    fn test_self_relation_is_single_link() {
        let delta = EdgeDelta::between(5, &set(&[]), &set(&[5]));
        assert_eq!(
            delta.directed_links(),
            vec![DirectedLink { from: 5, to: 5, change: LinkChange::Insert }]
        );
    }

    #[tokio::test]
    async fn test_reconcile_without_request_is_none() {
        let (store, import_id) = seeded_store().await;
        let reconciler = RelativeEdgeReconciler::new(&store);

        let delta = reconciler.reconcile(import_id, 1, &set(&[2]), None).await.unwrap();

        assert!(delta.is_none());
    }

    #[tokio::test]
    async fn test_reconcile_replaces_relatives() {
        let (store, import_id) = seeded_store().await;
        let reconciler = RelativeEdgeReconciler::new(&store);

        let delta = reconciler
            .reconcile(import_id, 1, &set(&[2]), Some(&[3, 4]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(delta.to_add, set(&[3, 4]));
        assert_eq!(delta.to_remove, set(&[2]));
    }

    #[tokio::test]
    async fn test_reconcile_accepts_subject_as_own_relative() {
        let (store, import_id) = seeded_store().await;
        let reconciler = RelativeEdgeReconciler::new(&store);

        let delta = reconciler
            .reconcile(import_id, 3, &set(&[]), Some(&[3]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(delta.to_add, set(&[3]));
    }

    #[tokio::test]
    async fn test_reconcile_rejects_unknown_relative() {
        let (store, import_id) = seeded_store().await;
        let reconciler = RelativeEdgeReconciler::new(&store);

        let err = reconciler
            .reconcile(import_id, 1, &set(&[2]), Some(&[2, 42]))
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::RelativesNotFound));
    }

    #[tokio::test]
    async fn test_reconcile_rejects_duplicate_relative() {
        let (store, import_id) = seeded_store().await;
        let reconciler = RelativeEdgeReconciler::new(&store);

        let err = reconciler
            .reconcile(import_id, 1, &set(&[2]), Some(&[3, 3]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::DuplicateRelatives {
                citizen_id: 1,
                relative_id: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_reconcile_empty_list_removes_everything() {
        let (store, import_id) = seeded_store().await;
        let reconciler = RelativeEdgeReconciler::new(&store);

        let delta = reconciler
            .reconcile(import_id, 1, &set(&[2]), Some(&[]))
            .await
            .unwrap()
            .unwrap();

        assert!(delta.to_add.is_empty());
        assert_eq!(delta.to_remove, set(&[2]));
    }
}
