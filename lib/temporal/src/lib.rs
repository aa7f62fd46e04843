//! A temporal index for Parliament.
//!
//! The index stores the instants and intervals attached to nodes through `pt:asInstant` and
//! `pt:asInterval` and answers the relations of Allen's interval algebra, together with a few
//! relations between instants and intervals, as SPARQL property functions:
//!
//! ```sparql
//! PREFIX pt: <http://bbn.com/ParliamentTime#>
//! SELECT ?event WHERE {
//!     ?event pt:intervalDuring [ pt:asInterval "2024-01-01,2025-01-01"^^pt:intervalLiteral ] .
//! }
//! ```
//!
//! Graphs without a usable index answer the same relations with a [GraphTemporalFunction], which
//! reads the extents from the triples of the graph.
//!
//! Every relation is answered in two steps. A range scan over the ordered instants of the index
//! collects candidates, which are then checked with the exact test of the relation. Which argument
//! of the relation is bound decides which scan is used.

mod extent;
mod factory;
mod function;
mod graph_function;
mod index;
mod operand;
mod record_factory;
mod relation;
mod scan;

pub use extent::{parse_instant, TemporalExtent, TemporalParseError};
pub use factory::{temporal_factory, TemporalIndexFactory, DIRECTORY_PROPERTY};
pub use function::TemporalPropertyFunction;
pub use graph_function::{graph_property_functions, GraphTemporalFunction};
pub use index::TemporalIndex;
pub use record_factory::TemporalRecordFactory;
pub use relation::TemporalRelation;
pub use scan::{Scan, ScanRole};
