//! Error types shared across the crate.
//!
//! Every failure is local to a single call: an error never leaves a replica
//! in a corrupted state and never requires cross-replica coordination to
//! resolve. Recovery policy (buffering, redelivery) belongs to the caller.

use crate::crdt::id::OpId;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors surfaced by replica operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// An operation references an origin that is not yet present locally.
    ///
    /// Recoverable: buffer the payload and redeliver it once the missing
    /// dependency has been applied.
    #[error("operation references missing origin {missing}")]
    Causality { missing: OpId },

    /// A delete references an identifier this replica has never seen.
    ///
    /// Same recovery path as [`SyncError::Causality`].
    #[error("unknown identifier {0}")]
    UnknownIdentifier(OpId),

    /// An insert carries an already-known identifier.
    ///
    /// Internal only: [`crate::Replica::apply`] converts this into a no-op
    /// so that redelivered payloads stay idempotent.
    #[error("duplicate operation {0}")]
    DuplicateOperation(OpId),

    /// Restoring the snapshot would collide with identifiers this replica
    /// has already issued, or the snapshot is for the other variant.
    ///
    /// Fatal to the restore call only; existing state is untouched.
    #[error("incompatible snapshot: {0}")]
    IncompatibleSnapshot(String),

    /// Position is out of bounds for the current visible sequence.
    #[error("position {position} out of bounds (length: {length})")]
    PositionOutOfBounds { position: usize, length: usize },

    /// Range is out of bounds for the current visible sequence.
    #[error("range {start}..{end} out of bounds (length: {length})")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        length: usize,
    },

    /// A payload could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(String),
}
