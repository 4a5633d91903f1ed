//! Replica tags, operation identifiers, and the per-replica counter.
//!
//! Every inserted element is named by an [`OpId`]: the issuing replica's
//! tag plus a monotonic counter value. The `Ord` implementation defines the
//! global tie-break order used by both sequence variants, so it is the
//! foundation of deterministic convergence.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Opaque, totally ordered token identifying one replica.
///
/// Tags are an explicit configuration parameter passed at replica
/// construction; the crate never generates them. Two replicas in one
/// system must never share a tag.
///
/// # Example
///
/// ```rust
/// use seqsync_core::ReplicaTag;
///
/// let a = ReplicaTag::new("alice");
/// let b = ReplicaTag::new("bob");
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaTag(String);

impl ReplicaTag {
    /// Create a tag from any string-like value.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReplicaTag {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for ReplicaTag {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

impl std::fmt::Display for ReplicaTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique identifier for one inserted element.
///
/// Identifiers are never reused and never change once assigned. Ordering
/// is lexicographic by `(counter, replica)`: the counter carries causal
/// freshness (origins always have a strictly smaller counter than the
/// elements inserted between them), and the replica tag breaks ties
/// between concurrent operations so the order is total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpId {
    /// Counter value at issue time.
    pub counter: u64,

    /// Issuing replica.
    pub replica: ReplicaTag,
}

impl OpId {
    /// Create a new identifier.
    pub fn new(replica: ReplicaTag, counter: u64) -> Self {
        Self { counter, replica }
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        // Counter first (causal freshness), replica tag as the tie-break
        // for concurrent operations.
        match self.counter.cmp(&other.counter) {
            Ordering::Equal => self.replica.cmp(&other.replica),
            other => other,
        }
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for OpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.replica, self.counter)
    }
}

/// Lamport-style monotonic counter.
///
/// Each replica owns one counter: `tick` allocates the next local value
/// and `observe` raises the counter past any remotely issued value, so a
/// later local insert always outranks the origins it references. The
/// counter never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpCounter {
    value: u64,
}

impl OpCounter {
    /// Create a counter starting at 0.
    pub fn new() -> Self {
        Self { value: 0 }
    }

    /// Current value without incrementing.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Increment and return the new value (for local inserts).
    pub fn tick(&mut self) -> u64 {
        self.value += 1;
        self.value
    }

    /// Raise the counter to `max(local, remote)` (on remote applies).
    pub fn observe(&mut self, remote: u64) {
        self.value = self.value.max(remote);
    }
}
