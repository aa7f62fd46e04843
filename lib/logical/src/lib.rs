//! The logical layer of the Parliament query core.
//!
//! A query arrives as a [spargebra](https://docs.rs/spargebra) graph pattern and is converted into
//! an [Op] tree. The [rewrite] pipeline then recognizes property function calls and reshapes
//! filters and joins. The [join] module decides which joins may stream their left side into the
//! right side, and the [cost] module holds the estimates used to order basic graph patterns.

pub mod cost;
pub mod join;
mod op;
pub mod rewrite;

pub use op::{expression_variables, is_constant, ExpressionDisplay, Op};

/// The result type of the rewrite rules, which build on the tree traversal of DataFusion.
pub type DFResult<T> = datafusion_common::Result<T>;
