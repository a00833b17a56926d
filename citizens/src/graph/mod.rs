//! Relative graph validation and reconciliation.
//!
//! Relations between citizens are undirected. They are stored as directed
//! links on both endpoints, so every write in this module is expressed in terms
//! of link pairs that keep the graph symmetric.

pub mod reconciler;
pub mod validator;

pub use reconciler::{DirectedLink, EdgeDelta, LinkChange, RelativeEdgeReconciler};
pub use validator::{RelationGraphValidator, ValidatedBatch};

use crate::models::EdgeMap;

/// True when every link in `edges` has its reverse.
pub fn is_symmetric(edges: &EdgeMap) -> bool {
    edges.iter().all(|(id, relatives)| {
        relatives
            .iter()
            .all(|rel| edges.get(rel).is_some_and(|back| back.contains(id)))
    })
}
