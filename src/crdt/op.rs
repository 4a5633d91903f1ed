//! Operation records exchanged between replicas.

use super::id::OpId;
use serde::{Deserialize, Serialize};

/// A single self-describing operation.
///
/// Inserts carry the identifiers of the elements that were immediately to
/// the left and right of the insertion point in the issuing replica's
/// visible sequence - the causal anchors both variants use to resolve
/// concurrent inserts at the same gap. Deletes reference the target
/// identifier only; no new identifier is allocated for a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation<T> {
    /// Insert one element between its origins.
    Insert {
        id: OpId,
        value: T,
        left_origin: Option<OpId>,
        right_origin: Option<OpId>,
    },

    /// Tombstone the element with the given identifier.
    Delete { id: OpId },
}

impl<T> Operation<T> {
    /// The identifier this operation is about.
    pub fn id(&self) -> &OpId {
        match self {
            Operation::Insert { id, .. } => id,
            Operation::Delete { id } => id,
        }
    }
}
