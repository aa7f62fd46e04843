//! The cost model used to order triple patterns and to judge join orders.

mod selectivity;
mod treewidth;

pub use selectivity::*;
pub use treewidth::*;
