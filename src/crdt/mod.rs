//! CRDT (Conflict-free Replicated Data Type) sequence implementations
//!
//! Two sequence variants share one identifier scheme and one operation
//! format; only the attach/tie-break rule differs:
//!
//! - **Fugue tree** (`fugue`): causal tree ordering with the
//!   anti-interleaving guarantee
//! - **Max-Simple list** (`max_simple`): flat identifier-comparison
//!   ordering, kept to make the interleaving anomaly reproducible
//!
//! # References
//!
//! - "The Art of the Fugue: Minimizing Interleaving in Collaborative Text
//!   Editing" by Weidner, Gentle and Kleppmann
//! - "Conflict-free Replicated Data Types" (INRIA Research Report 7687)

use serde::{Deserialize, Serialize};

pub mod fugue;
pub mod id;
pub mod max_simple;
pub mod op;
pub mod snapshot;

pub use fugue::FugueTree;
pub use id::{OpCounter, OpId, ReplicaTag};
pub use max_simple::MaxSimpleList;
pub use op::Operation;
pub use snapshot::{Snapshot, SnapshotNode};

/// Which ordering variant a replica runs.
///
/// The variant is fixed at replica construction and embedded in snapshots;
/// replicas of different kinds do not share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceKind {
    /// Tree-based Fugue ordering (non-interleaving).
    Fugue,
    /// Flat identifier-comparison ordering (interleaving-prone baseline).
    MaxSimple,
}

impl std::fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceKind::Fugue => write!(f, "fugue"),
            SequenceKind::MaxSimple => write!(f, "max-simple"),
        }
    }
}
