//! Payload encoding and decoding.
//!
//! Body bytes are serde_json; the trailing byte is the discriminant
//! (`0` = incremental operation, `1` = full snapshot). Malformed input is
//! a [`SyncError::Protocol`] error, never a panic.

use crate::crdt::op::Operation;
use crate::crdt::snapshot::Snapshot;
use crate::error::{Result, SyncError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trailing discriminant for an incremental operation payload.
const OPERATION_BYTE: u8 = 0;

/// Trailing discriminant for a full-state snapshot payload.
const SNAPSHOT_BYTE: u8 = 1;

/// A decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    Operation(Operation<T>),
    Snapshot(Snapshot<T>),
}

/// Encode one operation as an opaque payload.
pub fn encode_operation<T: Serialize>(op: &Operation<T>) -> Result<Vec<u8>> {
    let mut payload = serde_json::to_vec(op)
        .map_err(|e| SyncError::Protocol(format!("failed to encode operation: {}", e)))?;
    payload.push(OPERATION_BYTE);
    Ok(payload)
}

/// Encode a full-state snapshot as an opaque payload.
pub fn encode_snapshot<T: Serialize>(snapshot: &Snapshot<T>) -> Result<Vec<u8>> {
    let mut payload = serde_json::to_vec(snapshot)
        .map_err(|e| SyncError::Protocol(format!("failed to encode snapshot: {}", e)))?;
    payload.push(SNAPSHOT_BYTE);
    Ok(payload)
}

/// Decode an opaque payload back into an operation or snapshot.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<Payload<T>> {
    let (discriminant, body) = payload
        .split_last()
        .ok_or_else(|| SyncError::Protocol("empty payload".to_string()))?;

    match *discriminant {
        OPERATION_BYTE => {
            let op = serde_json::from_slice(body)
                .map_err(|e| SyncError::Protocol(format!("failed to decode operation: {}", e)))?;
            Ok(Payload::Operation(op))
        }
        SNAPSHOT_BYTE => {
            let snapshot = serde_json::from_slice(body)
                .map_err(|e| SyncError::Protocol(format!("failed to decode snapshot: {}", e)))?;
            Ok(Payload::Snapshot(snapshot))
        }
        other => Err(SyncError::Protocol(format!(
            "unknown payload discriminant {}",
            other
        ))),
    }
}
