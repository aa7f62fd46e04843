//! Contains the in-memory base graph of the Parliament query core.
//!
//! A [Graph] owns its triples and the reader/writer lock that guards them. Queries hold a
//! [GraphReadGuard] for their whole evaluation, while every mutation goes through a
//! [GraphWriteGuard] that synchronously notifies the registered [GraphListener]s before the lock
//! is released.

mod graph;
mod table;
mod union;

pub use graph::*;
pub use table::TripleTable;
pub use union::{union_estimate, UnionSource};
