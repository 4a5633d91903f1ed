//! Replica: one independent copy of the sequence.
//!
//! A replica owns its structure (one of the two variants), a Lamport-style
//! counter that is the sole source of freshness for locally issued
//! identifiers, and an outbox of encoded payloads. Replicas are
//! single-threaded, sequential units: local inserts and remote applies are
//! serialized, nothing blocks or retries internally, and the only contract
//! between replicas is causal delivery of the payloads the caller routes.

use crate::crdt::id::{OpCounter, OpId, ReplicaTag};
use crate::crdt::op::Operation;
use crate::crdt::snapshot::{Snapshot, SnapshotNode};
use crate::crdt::{FugueTree, MaxSimpleList, SequenceKind};
use crate::error::{Result, SyncError};
use crate::protocol::payload::{self, Payload};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The variant-specific structure behind one replica.
///
/// Identifier, counter, and encoding logic are shared; only the
/// attach/tie-break rule differs between the arms.
#[derive(Debug, Clone)]
enum Structure<T> {
    Fugue(FugueTree<T>),
    MaxSimple(MaxSimpleList<T>),
}

impl<T> Structure<T> {
    fn new(kind: SequenceKind) -> Self {
        match kind {
            SequenceKind::Fugue => Structure::Fugue(FugueTree::new()),
            SequenceKind::MaxSimple => Structure::MaxSimple(MaxSimpleList::new()),
        }
    }

    fn kind(&self) -> SequenceKind {
        match self {
            Structure::Fugue(_) => SequenceKind::Fugue,
            Structure::MaxSimple(_) => SequenceKind::MaxSimple,
        }
    }

    fn attach(
        &mut self,
        id: OpId,
        value: T,
        left_origin: Option<OpId>,
        right_origin: Option<OpId>,
    ) -> Result<()> {
        match self {
            Structure::Fugue(tree) => tree.attach(id, value, left_origin, right_origin),
            Structure::MaxSimple(list) => list.attach(id, value, left_origin, right_origin),
        }
    }

    fn tombstone(&mut self, id: &OpId) -> Result<()> {
        match self {
            Structure::Fugue(tree) => tree.tombstone(id),
            Structure::MaxSimple(list) => list.tombstone(id),
        }
    }

    fn visible_ids(&mut self) -> Vec<OpId> {
        match self {
            Structure::Fugue(tree) => tree.visible_ids(),
            Structure::MaxSimple(list) => list.visible_ids(),
        }
    }

    fn max_counter_for(&self, tag: &ReplicaTag) -> u64 {
        match self {
            Structure::Fugue(tree) => tree.max_counter_for(tag),
            Structure::MaxSimple(list) => list.max_counter_for(tag),
        }
    }
}

impl<T: Clone> Structure<T> {
    fn visible_values(&mut self) -> Vec<T> {
        match self {
            Structure::Fugue(tree) => tree.visible_values(),
            Structure::MaxSimple(list) => list.visible_values(),
        }
    }

    fn node_records(&self) -> Vec<SnapshotNode<T>> {
        match self {
            Structure::Fugue(tree) => tree.node_records(),
            Structure::MaxSimple(list) => list.node_records(),
        }
    }
}

/// One replica of the shared sequence.
///
/// Local mutations allocate identifiers, splice the structure, and queue
/// one encoded payload per operation in the outbox; the caller drains the
/// outbox and routes the payloads to peers, which feed them to
/// [`Replica::apply`]. The visible sequence is always derived from the
/// structure, never stored redundantly.
///
/// # Example
///
/// ```rust
/// use seqsync_core::{Replica, SequenceKind};
///
/// let mut alice: Replica<char> = Replica::new("alice", SequenceKind::Fugue);
/// let mut bob: Replica<char> = Replica::new("bob", SequenceKind::Fugue);
///
/// alice.insert(0, &['a', 'b']).unwrap();
/// bob.insert(0, &['x']).unwrap();
///
/// // Exchange payloads both ways; any causally valid order converges.
/// for payload in alice.drain_outbox() {
///     bob.apply(&payload).unwrap();
/// }
/// for payload in bob.drain_outbox() {
///     alice.apply(&payload).unwrap();
/// }
///
/// assert_eq!(alice.visible(), bob.visible());
/// ```
#[derive(Debug, Clone)]
pub struct Replica<T> {
    tag: ReplicaTag,
    counter: OpCounter,
    structure: Structure<T>,
    outbox: Vec<Vec<u8>>,
}

impl<T> Replica<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    /// Create a replica with an explicit tag.
    ///
    /// Tags must be unique across the system; the crate never generates
    /// them.
    pub fn new(tag: impl Into<ReplicaTag>, kind: SequenceKind) -> Self {
        Self {
            tag: tag.into(),
            counter: OpCounter::new(),
            structure: Structure::new(kind),
            outbox: Vec::new(),
        }
    }

    /// This replica's tag.
    pub fn tag(&self) -> &ReplicaTag {
        &self.tag
    }

    /// Which ordering variant this replica runs.
    pub fn kind(&self) -> SequenceKind {
        self.structure.kind()
    }

    /// Current counter value.
    pub fn counter(&self) -> u64 {
        self.counter.value()
    }

    /// Length of the visible sequence.
    pub fn len(&mut self) -> usize {
        self.structure.visible_ids().len()
    }

    /// Whether the visible sequence is empty.
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// The visible sequence (tombstoned elements excluded), derived by a
    /// deterministic traversal of the structure.
    pub fn visible(&mut self) -> Vec<T> {
        self.structure.visible_values()
    }

    /// Insert `values` at `position` in the visible sequence.
    ///
    /// Allocates one fresh identifier per value and queues one payload per
    /// value in the outbox, in traversal order. Within the run each
    /// element's left origin is its predecessor and its right origin the
    /// element that was at `position` - this chaining is what lets the
    /// Fugue variant keep the run contiguous under concurrent merges.
    ///
    /// Returns the allocated identifiers.
    ///
    /// # Errors
    ///
    /// [`SyncError::PositionOutOfBounds`] if `position > len`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use seqsync_core::{Replica, SequenceKind};
    ///
    /// let mut replica: Replica<char> = Replica::new("r1", SequenceKind::Fugue);
    /// replica.insert(0, &['h', 'i']).unwrap();
    /// replica.insert(1, &['e', 'y']).unwrap();
    ///
    /// assert_eq!(replica.visible(), vec!['h', 'e', 'y', 'i']);
    /// ```
    pub fn insert(&mut self, position: usize, values: &[T]) -> Result<Vec<OpId>> {
        let length = self.len();
        if position > length {
            return Err(SyncError::PositionOutOfBounds { position, length });
        }

        let visible = self.structure.visible_ids();
        let mut left_origin = (position > 0).then(|| visible[position - 1].clone());
        let right_origin = visible.get(position).cloned();

        let mut ids = Vec::with_capacity(values.len());
        for value in values {
            let id = OpId::new(self.tag.clone(), self.counter.tick());
            let op = Operation::Insert {
                id: id.clone(),
                value: value.clone(),
                left_origin: left_origin.clone(),
                right_origin: right_origin.clone(),
            };
            let encoded = payload::encode_operation(&op)?;
            self.structure
                .attach(id.clone(), value.clone(), left_origin, right_origin.clone())?;
            self.outbox.push(encoded);
            left_origin = Some(id.clone());
            ids.push(id);
        }
        Ok(ids)
    }

    /// Tombstone `length` elements starting at `position` and queue one
    /// delete payload per element.
    ///
    /// Deletes reference existing identifiers only; no identifier is
    /// allocated and the counter does not advance. Returns the tombstoned
    /// identifiers.
    ///
    /// # Errors
    ///
    /// [`SyncError::RangeOutOfBounds`] if the range exceeds the visible
    /// length.
    pub fn delete(&mut self, position: usize, length: usize) -> Result<Vec<OpId>> {
        let visible_length = self.len();
        if position + length > visible_length {
            return Err(SyncError::RangeOutOfBounds {
                start: position,
                end: position + length,
                length: visible_length,
            });
        }

        let targets: Vec<OpId> = self.structure.visible_ids()[position..position + length].to_vec();
        for id in &targets {
            let op: Operation<T> = Operation::Delete { id: id.clone() };
            let encoded = payload::encode_operation(&op)?;
            self.structure.tombstone(id)?;
            self.outbox.push(encoded);
        }
        Ok(targets)
    }

    /// Apply a payload received from a peer.
    ///
    /// Inserts validate both origins and advance the counter past the
    /// remote identifier; redelivered payloads are no-ops. Snapshot
    /// payloads replace this replica's structure wholesale (see
    /// [`Replica::restore`]).
    ///
    /// # Errors
    ///
    /// [`SyncError::Causality`] / [`SyncError::UnknownIdentifier`] when a
    /// dependency has not arrived yet - buffer the payload and redeliver
    /// it once the dependency has been applied. The replica's state is
    /// unchanged on error.
    pub fn apply(&mut self, payload: &[u8]) -> Result<()> {
        match payload::decode::<T>(payload)? {
            Payload::Operation(Operation::Insert {
                id,
                value,
                left_origin,
                right_origin,
            }) => {
                let counter = id.counter;
                match self.structure.attach(id, value, left_origin, right_origin) {
                    Ok(()) => {
                        self.counter.observe(counter);
                        Ok(())
                    }
                    // Idempotence: a redelivered insert is a no-op.
                    Err(SyncError::DuplicateOperation(_)) => Ok(()),
                    Err(e) => Err(e),
                }
            }
            Payload::Operation(Operation::Delete { id }) => self.structure.tombstone(&id),
            Payload::Snapshot(snapshot) => self.restore_from(snapshot),
        }
    }

    /// Drain the queued outbound payloads, in generation order.
    ///
    /// The caller routes these to peers; the core never sends anything
    /// itself.
    pub fn drain_outbox(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.outbox)
    }

    /// Serialize the full structure and counter for replica catch-up.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            kind: self.structure.kind(),
            counter: self.counter.value(),
            nodes: self.structure.node_records(),
        };
        payload::encode_snapshot(&snapshot)
    }

    /// Replace this replica's structure and counter with a snapshot.
    ///
    /// # Errors
    ///
    /// [`SyncError::IncompatibleSnapshot`] if the snapshot is for the
    /// other variant, or if this replica has issued identifiers the
    /// snapshot does not contain (future ticks could collide with them).
    /// [`SyncError::Protocol`] if the payload is not a snapshot. Existing
    /// state is untouched on any error.
    pub fn restore(&mut self, payload: &[u8]) -> Result<()> {
        match payload::decode::<T>(payload)? {
            Payload::Snapshot(snapshot) => self.restore_from(snapshot),
            Payload::Operation(_) => Err(SyncError::Protocol(
                "expected a snapshot payload".to_string(),
            )),
        }
    }

    fn restore_from(&mut self, snapshot: Snapshot<T>) -> Result<()> {
        if snapshot.kind != self.structure.kind() {
            return Err(SyncError::IncompatibleSnapshot(format!(
                "snapshot is {} but this replica is {}",
                snapshot.kind,
                self.structure.kind()
            )));
        }

        // Identifiers this replica issued but the snapshot lacks would be
        // reissued by future ticks.
        let issued = self.structure.max_counter_for(&self.tag);
        let snapshot_local_max = snapshot
            .nodes
            .iter()
            .filter(|node| node.id.replica == self.tag)
            .map(|node| node.id.counter)
            .max()
            .unwrap_or(0);
        if issued > snapshot_local_max {
            return Err(SyncError::IncompatibleSnapshot(format!(
                "replica {} has issued identifiers up to counter {} but the snapshot only holds {}",
                self.tag, issued, snapshot_local_max
            )));
        }

        // Build the replacement fully before committing anything.
        let mut fresh = Structure::new(snapshot.kind);
        let mut nodes = snapshot.nodes;
        // Attach in ascending id order so origins resolve before their
        // dependents.
        nodes.sort_by(|x, y| x.id.cmp(&y.id));

        let mut max_seen = snapshot.counter;
        for node in nodes {
            max_seen = max_seen.max(node.id.counter);
            let id = node.id.clone();
            match fresh.attach(node.id, node.value, node.left_origin, node.right_origin) {
                Ok(()) => {}
                Err(SyncError::DuplicateOperation(_)) => continue,
                Err(SyncError::Causality { missing }) => {
                    return Err(SyncError::Protocol(format!(
                        "snapshot references missing origin {}",
                        missing
                    )))
                }
                Err(e) => return Err(e),
            }
            if node.tombstoned {
                fresh.tombstone(&id)?;
            }
        }

        self.structure = fresh;
        self.counter.observe(max_seen);
        Ok(())
    }
}
