//! SeqSync Core - Replicated sequence CRDTs
//!
//! This crate implements a replicated, conflict-free list (sequence) data
//! type: multiple replicas insert and delete elements without coordination
//! and later reconcile into a single deterministic order. Two ordering
//! variants are provided behind one replica API:
//!
//! - **Fugue** ([`crdt::fugue::FugueTree`]): a tree of inserted elements
//!   keyed by causal left/right origins. Concurrent contiguous runs never
//!   interleave element-by-element.
//! - **Max-Simple** ([`crdt::max_simple::MaxSimpleList`]): a flat list that
//!   resolves concurrent inserts at the same gap purely by comparing
//!   identifiers. Simpler, convergent, and intentionally vulnerable to the
//!   interleaving anomaly - kept as a comparison baseline.
//!
//! Replicas exchange self-describing operation payloads (and full-state
//! snapshots) as opaque bytes; routing those bytes between replicas is the
//! caller's job.
//!
//! # Examples
//!
//! ```rust
//! use seqsync_core::{Replica, SequenceKind};
//!
//! let mut left: Replica<char> = Replica::new("alice", SequenceKind::Fugue);
//! let mut right: Replica<char> = Replica::new("bob", SequenceKind::Fugue);
//!
//! left.insert(0, &['h', 'i']).unwrap();
//! for payload in left.drain_outbox() {
//!     right.apply(&payload).unwrap();
//! }
//!
//! assert_eq!(right.visible(), vec!['h', 'i']);
//! ```

pub mod crdt;
pub mod error;
pub mod protocol;
pub mod replica;

// Re-exports for convenience
pub use crdt::id::{OpId, ReplicaTag};
pub use crdt::SequenceKind;
pub use error::{Result, SyncError};
pub use replica::Replica;
