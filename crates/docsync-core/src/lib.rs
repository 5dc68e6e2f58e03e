//! # docsync Core
//!
//! CRDT primitives and the versioned document store for docsync.
//!
//! This crate provides:
//! - Last-Writer-Wins register ordered by `(timestamp, node id)`
//! - Observed-Remove set with per-insertion tags
//! - Document model with a monotonically increasing version
//! - In-memory store owning every document and its operation log

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod crdt;
pub mod document;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use crdt::{Crdt, EmptyTagSet, LwwRegister, LwwWrite, OrSet};
pub use document::{
    CrdtType, Document, Instructions, Operation, OperationBody, Seed, SetAdd, SetRemove, Snapshot,
};
pub use store::{MemoryStore, StoreError};
