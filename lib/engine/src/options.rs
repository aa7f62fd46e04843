use parliament_logical::cost::DEFAULT_TREEWIDTH_LIMIT;
use parliament_logical::rewrite::RewriteOptions;

/// Controls how a query is optimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Orders basic graph patterns by the selectivity of their triples.
    pub default_optimization: bool,
    /// Reorders the triples of a basic graph pattern for every incoming solution that binds some of
    /// its variables.
    pub dynamic_optimization: bool,
    pub rewrite: RewriteOptions,
    /// The largest basic graph pattern for which a reordering is checked with the treewidth
    /// estimator. Larger patterns use the selectivity order as is.
    pub treewidth_limit: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            default_optimization: true,
            dynamic_optimization: true,
            rewrite: RewriteOptions::default(),
            treewidth_limit: DEFAULT_TREEWIDTH_LIMIT,
        }
    }
}
