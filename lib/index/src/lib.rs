//! The secondary index framework of Parliament.
//!
//! A secondary index stores [Record]s that are derived from the triples of a single graph. Any kind
//! of index implements the [Index] contract and is created by an [IndexFactory]. The
//! [IndexManager] keeps track of which indexes belong to which graph and keeps their content in
//! sync with the graph by registering a listener that is notified of every mutation.
//!
//! At query time, the indexes of a graph are collected in an [IndexSet]. It exposes the hooks the
//! query engine uses to access the indexes:
//! - [IndexPatternQuerier]s answer parts of a basic graph pattern.
//! - [IndexPropertyFunction]s implement SPARQL property functions.
//! - [RangeSource]s answer range filters over a numeric predicate.

mod content;
mod factory;
mod handle;
mod index;
mod lifecycle;
mod manager;
pub mod numeric;
mod persistence;
mod query;
mod record;
mod set;

pub use content::{IndexCore, RecordStore};
pub use factory::*;
pub use handle::*;
pub use index::*;
pub use lifecycle::*;
pub use manager::*;
pub use persistence::*;
pub use query::*;
pub use record::Record;
pub use set::IndexSet;
