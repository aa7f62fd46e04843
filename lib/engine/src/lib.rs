//! The query executor of Parliament.
//!
//! The executor evaluates a rewritten [Op](parliament_logical::Op) tree against an
//! [ExecutionContext] that provides the queried graphs, their secondary indexes, and the
//! registered property functions. Evaluation is pull based: every operator returns a lazy iterator
//! over its solutions, and basic graph patterns are reordered by selectivity before they are
//! matched against the triple source.
//!
//! Queries are tracked by a [QueryTracker] so that they can be cancelled while they run.

mod context;
mod eval;
pub mod expression;
mod functions;
mod options;
mod tracker;

pub use context::{ExecutionContext, NamedGraphSource};
pub use eval::{execute, Executor};
pub use functions::{PropertyFunction, PropertyFunctionRegistry};
pub use options::QueryOptions;
pub use tracker::{QueryHandle, QueryState, QueryTracker};
