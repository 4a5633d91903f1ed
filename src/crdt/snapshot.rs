//! Full-state snapshot records for replica catch-up.
//!
//! A snapshot flattens a structure into its per-element records, sorted
//! ascending by identifier. Because origins always carry a smaller counter
//! than the elements between them, re-attaching the records in that order
//! reconstructs the structure exactly; no tree shape is serialized.

use super::id::OpId;
use super::SequenceKind;
use serde::{Deserialize, Serialize};

/// One element's record inside a snapshot: the insert metadata plus the
/// tombstone flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode<T> {
    pub id: OpId,
    pub value: T,
    pub left_origin: Option<OpId>,
    pub right_origin: Option<OpId>,
    pub tombstoned: bool,
}

/// Full state of one replica's structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Which variant produced this snapshot.
    pub kind: SequenceKind,

    /// The source replica's counter at snapshot time.
    pub counter: u64,

    /// All elements, tombstones included, ascending by id.
    pub nodes: Vec<SnapshotNode<T>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::id::ReplicaTag;

    #[test]
    fn test_serialization_round_trip() {
        let snapshot = Snapshot {
            kind: SequenceKind::MaxSimple,
            counter: 3,
            nodes: vec![SnapshotNode {
                id: OpId::new(ReplicaTag::new("r1"), 1),
                value: 'a',
                left_origin: None,
                right_origin: None,
                tombstoned: true,
            }],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot<char> = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot, back);
    }
}
