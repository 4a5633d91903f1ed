//! Max-Simple flat sequence - the comparison baseline.
//!
//! No tree: every element lives in one ordered collection, positioned
//! strictly between its left and right origins. Concurrent inserts at the
//! same gap are resolved purely by comparing identifiers: the greater id
//! is placed first. Any deterministic rule converges here, but only the
//! tree rule in [`crate::crdt::fugue`] avoids interleaving - this variant
//! exists to make the interleaving anomaly reproducible and comparable.
//!
//! The visible order is a pure function of the element set: it is derived
//! by integrating elements in ascending identifier order (origins always
//! carry a smaller counter, so both bounds of a gap are placed before
//! anything that references them). Deriving rather than trusting arrival
//! order is what makes convergence independent of delivery order.

use super::id::{OpId, ReplicaTag};
use super::snapshot::SnapshotNode;
use crate::error::{Result, SyncError};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct FlatNode<T> {
    value: T,
    left_origin: Option<OpId>,
    right_origin: Option<OpId>,
    tombstoned: bool,
}

/// Flat sequence with identifier-comparison ordering.
///
/// # Example
///
/// ```rust
/// use seqsync_core::crdt::max_simple::MaxSimpleList;
/// use seqsync_core::{OpId, ReplicaTag};
///
/// let mut list = MaxSimpleList::new();
/// let a = OpId::new(ReplicaTag::new("r1"), 1);
/// let b = OpId::new(ReplicaTag::new("r1"), 2);
///
/// list.attach(a.clone(), 'a', None, None).unwrap();
/// list.attach(b, 'b', Some(a), None).unwrap();
///
/// assert_eq!(list.visible_values(), vec!['a', 'b']);
/// ```
#[derive(Debug, Clone)]
pub struct MaxSimpleList<T> {
    /// Id-ordered store; iteration order doubles as integration order.
    nodes: BTreeMap<OpId, FlatNode<T>>,
    /// Cached derived order, tombstones included.
    order: Vec<OpId>,
    order_valid: bool,
}

impl<T> Default for MaxSimpleList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MaxSimpleList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            order: Vec::new(),
            order_valid: true,
        }
    }

    /// Whether an element with this identifier is present (live or
    /// tombstoned).
    pub fn contains(&self, id: &OpId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of elements, tombstones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a new element between its origins.
    ///
    /// # Errors
    ///
    /// [`SyncError::DuplicateOperation`] if the identifier is already
    /// known, [`SyncError::Causality`] if an origin is missing.
    pub fn attach(
        &mut self,
        id: OpId,
        value: T,
        left_origin: Option<OpId>,
        right_origin: Option<OpId>,
    ) -> Result<()> {
        if self.contains(&id) {
            return Err(SyncError::DuplicateOperation(id));
        }
        for origin in [&left_origin, &right_origin].into_iter().flatten() {
            if !self.contains(origin) {
                return Err(SyncError::Causality {
                    missing: origin.clone(),
                });
            }
        }

        self.nodes.insert(
            id,
            FlatNode {
                value,
                left_origin,
                right_origin,
                tombstoned: false,
            },
        );
        self.order_valid = false;
        Ok(())
    }

    /// Mark an element as deleted. Idempotent.
    ///
    /// # Errors
    ///
    /// [`SyncError::UnknownIdentifier`] if the id was never seen.
    pub fn tombstone(&mut self, id: &OpId) -> Result<()> {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.tombstoned = true;
                Ok(())
            }
            None => Err(SyncError::UnknownIdentifier(id.clone())),
        }
    }

    /// Whether the element is tombstoned, or `None` if unknown.
    pub fn is_tombstoned(&self, id: &OpId) -> Option<bool> {
        self.nodes.get(id).map(|node| node.tombstoned)
    }

    /// The value stored for an identifier, tombstoned or not.
    pub fn value(&self, id: &OpId) -> Option<&T> {
        self.nodes.get(id).map(|node| &node.value)
    }

    /// Identifiers of the visible sequence, in order.
    pub fn visible_ids(&mut self) -> Vec<OpId> {
        self.ensure_order();
        self.order
            .iter()
            .filter(|id| !self.nodes[*id].tombstoned)
            .cloned()
            .collect()
    }

    /// Highest counter among identifiers issued by `tag`, 0 if none.
    pub fn max_counter_for(&self, tag: &ReplicaTag) -> u64 {
        self.nodes
            .keys()
            .filter(|id| &id.replica == tag)
            .map(|id| id.counter)
            .max()
            .unwrap_or(0)
    }

    /// Re-derive the full order from the element set if a structural
    /// change invalidated it.
    fn ensure_order(&mut self) {
        if self.order_valid {
            return;
        }

        let mut order: Vec<OpId> = Vec::with_capacity(self.nodes.len());
        for (id, node) in &self.nodes {
            // Ascending id order: both origins are already placed when a
            // dependent element arrives. A malformed origin (counter not
            // below the element's own) falls back to the widest gap, which
            // keeps the result a pure function of the element set.
            let start = node
                .left_origin
                .as_ref()
                .and_then(|left| position_of(&order, left))
                .map(|at| at + 1)
                .unwrap_or(0);
            let end = node
                .right_origin
                .as_ref()
                .and_then(|right| position_of(&order, right))
                .unwrap_or(order.len())
                .max(start);

            // Within the gap the greater identifier wins the earlier slot.
            let mut at = start;
            while at < end && order[at] > *id {
                at += 1;
            }
            order.insert(at, id.clone());
        }

        self.order = order;
        self.order_valid = true;
    }
}

impl<T: Clone> MaxSimpleList<T> {
    /// Values of the visible sequence, in order.
    pub fn visible_values(&mut self) -> Vec<T> {
        self.ensure_order();
        self.order
            .iter()
            .filter_map(|id| {
                let node = &self.nodes[id];
                (!node.tombstoned).then(|| node.value.clone())
            })
            .collect()
    }

    /// Flatten every element into snapshot records, ascending by id.
    pub fn node_records(&self) -> Vec<SnapshotNode<T>> {
        self.nodes
            .iter()
            .map(|(id, node)| SnapshotNode {
                id: id.clone(),
                value: node.value.clone(),
                left_origin: node.left_origin.clone(),
                right_origin: node.right_origin.clone(),
                tombstoned: node.tombstoned,
            })
            .collect()
    }
}

fn position_of(order: &[OpId], id: &OpId) -> Option<usize> {
    order.iter().position(|existing| existing == id)
}
