//! Wire format for replica exchange.
//!
//! Payloads are opaque to the transport harness: a serialized body plus a
//! one-byte discriminant distinguishing an incremental operation from a
//! full snapshot. The layout is stable within one running system and
//! round-trips through [`crate::Replica::apply`].

pub mod payload;

pub use payload::{decode, encode_operation, encode_snapshot, Payload};
