//! Fugue tree sequence - the anti-interleaving ordering variant.
//!
//! Elements form a tree encoding causal left/right neighbor relationships:
//! each element is logically a child of the origin it split away from, so
//! consecutive same-replica insertions chain into a single subtree instead
//! of fragmenting. The visible sequence is an in-order traversal of the
//! tree; it is never stored authoritatively and can be re-derived at any
//! time.
//!
//! Nodes live in an arena keyed by [`OpId`] and reference parents and
//! children by identifier, never by pointer. Deleted elements are
//! tombstoned in place: other elements may still name them as origins, so
//! they are never removed structurally.

use super::id::{OpId, ReplicaTag};
use super::snapshot::SnapshotNode;
use crate::error::{Result, SyncError};
use std::collections::HashMap;

/// Side of a parent an element attaches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct FugueNode<T> {
    value: T,
    left_origin: Option<OpId>,
    right_origin: Option<OpId>,
    /// `None` means the node hangs off the virtual root.
    parent: Option<OpId>,
    /// Ascending by id: the greatest sibling sits adjacent to the parent.
    left_children: Vec<OpId>,
    /// Descending by id: the greatest sibling sits adjacent to the parent,
    /// so a later-arriving run nests strictly before an earlier one.
    right_children: Vec<OpId>,
    tombstoned: bool,
}

/// Tree-based sequence with the Fugue ordering rule.
///
/// Causally unrelated concurrent runs stay contiguous in the merged order;
/// only the relative order between whole runs is tie-broken by identifier.
///
/// # Example
///
/// ```rust
/// use seqsync_core::crdt::fugue::FugueTree;
/// use seqsync_core::{OpId, ReplicaTag};
///
/// let mut tree = FugueTree::new();
/// let a = OpId::new(ReplicaTag::new("r1"), 1);
/// let b = OpId::new(ReplicaTag::new("r1"), 2);
///
/// tree.attach(a.clone(), 'a', None, None).unwrap();
/// tree.attach(b, 'b', Some(a), None).unwrap();
///
/// assert_eq!(tree.visible_values(), vec!['a', 'b']);
/// ```
#[derive(Debug, Clone)]
pub struct FugueTree<T> {
    nodes: HashMap<OpId, FugueNode<T>>,
    /// Right children of the virtual root, descending by id.
    roots: Vec<OpId>,
    /// Cached traversal order, tombstones included.
    order: Vec<OpId>,
    order_valid: bool,
}

impl<T> Default for FugueTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FugueTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            order: Vec::new(),
            order_valid: true,
        }
    }

    /// Whether an element with this identifier is present (live or
    /// tombstoned).
    pub fn contains(&self, id: &OpId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of elements in the arena, tombstones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Splice a new element into the tree.
    ///
    /// Both origins must already be present; the element becomes a child of
    /// whichever origin defines the tighter bound:
    ///
    /// - no origins: child of the virtual root
    /// - left origin only: right child of the left origin
    /// - right origin only: left child of the right origin
    /// - both: left child of the right origin when the left origin is an
    ///   ancestor of the right origin, otherwise right child of the left
    ///   origin
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

        let (parent, side) = match (&left_origin, &right_origin) {
            (None, None) => (None, Side::Right),
            (Some(a), None) => (Some(a.clone()), Side::Right),
            (None, Some(b)) => (Some(b.clone()), Side::Left),
            (Some(a), Some(b)) => {
                if self.is_ancestor(a, b) {
                    // The gap sits inside the right origin's left slot.
                    (Some(b.clone()), Side::Left)
                } else {
                    (Some(a.clone()), Side::Right)
                }
            }
        };

        self.nodes.insert(
            id.clone(),
            FugueNode {
                value,
                left_origin,
                right_origin,
                parent: parent.clone(),
                left_children: Vec::new(),
                right_children: Vec::new(),
                tombstoned: false,
            },
        );

        match (&parent, side) {
            (None, _) => insert_sorted_desc(&mut self.roots, &id),
            (Some(parent_id), Side::Right) => {
                if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                    insert_sorted_desc(&mut parent_node.right_children, &id);
                }
            }
            (Some(parent_id), Side::Left) => {
                if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                    insert_sorted_asc(&mut parent_node.left_children, &id);
                }
            }
        }

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

    /// Walk `b`'s parent chain looking for `a`.
    fn is_ancestor(&self, a: &OpId, b: &OpId) -> bool {
        let mut current = Some(b);
        while let Some(id) = current {
            if id == a {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent.as_ref());
        }
        false
    }

    /// Recompute the cached in-order traversal if a structural change
    /// invalidated it.
    ///
    /// Iterative with an explicit stack: sequential typing grows a right
    /// chain one level per element, deep enough to overflow recursion.
    fn ensure_order(&mut self) {
        if self.order_valid {
            return;
        }

        enum Step<'a> {
            Visit(&'a OpId),
            Emit(&'a OpId),
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<Step> = self.roots.iter().rev().map(Step::Visit).collect();

        while let Some(step) = stack.pop() {
            match step {
                Step::Emit(id) => order.push(id.clone()),
                Step::Visit(id) => {
                    let node = &self.nodes[id];
                    // Pushed in reverse so they pop in visit order: left
                    // children, the node itself, right children. Tombstoned
                    // nodes are traversed - they may have live children.
                    for child in node.right_children.iter().rev() {
                        stack.push(Step::Visit(child));
                    }
                    stack.push(Step::Emit(id));
                    for child in node.left_children.iter().rev() {
                        stack.push(Step::Visit(child));
                    }
                }
            }
        }

        self.order = order;
        self.order_valid = true;
    }
}

impl<T: Clone> FugueTree<T> {
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
        let mut records: Vec<SnapshotNode<T>> = self
            .nodes
            .iter()
            .map(|(id, node)| SnapshotNode {
                id: id.clone(),
                value: node.value.clone(),
                left_origin: node.left_origin.clone(),
                right_origin: node.right_origin.clone(),
                tombstoned: node.tombstoned,
            })
            .collect();
        records.sort_by(|x, y| x.id.cmp(&y.id));
        records
    }
}

impl<T> FugueTree<T> {
    /// Highest counter among identifiers issued by `tag`, 0 if none.
    pub fn max_counter_for(&self, tag: &ReplicaTag) -> u64 {
        self.nodes
            .keys()
            .filter(|id| &id.replica == tag)
            .map(|id| id.counter)
            .max()
            .unwrap_or(0)
    }
}

/// Insert into a descending-sorted sibling list.
fn insert_sorted_desc(list: &mut Vec<OpId>, id: &OpId) {
    let at = match list.binary_search_by(|probe| id.cmp(probe)) {
        Ok(at) | Err(at) => at,
    };
    list.insert(at, id.clone());
}

/// Insert into an ascending-sorted sibling list.
fn insert_sorted_asc(list: &mut Vec<OpId>, id: &OpId) {
    let at = match list.binary_search_by(|probe| probe.cmp(id)) {
        Ok(at) | Err(at) => at,
    };
    list.insert(at, id.clone());
}
