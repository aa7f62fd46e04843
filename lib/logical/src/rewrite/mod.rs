//! The rewrite pipeline that prepares an [Op] for execution.
//!
//! The pipeline first recognizes property function calls. Calls of functions backed by an index
//! are recognized before and after generic property functions, as recognizing generic functions
//! can expose new calls. Afterward, filters and joins are rewritten so that they interact well
//! with the recognized calls.

mod expand_one_of;
mod filter_conjunction;
mod filter_disjunction;
mod filter_equality;
mod filter_placement;
mod index_property_functions;
mod join_strategy;
mod path_flatten;
mod property_functions;
mod substitute;

pub use expand_one_of::ExpandOneOfRule;
pub use filter_conjunction::FilterConjunctionRule;
pub use filter_disjunction::FilterDisjunctionRule;
pub use filter_equality::FilterEqualityRule;
pub use filter_placement::FilterPlacementRule;
pub use index_property_functions::IndexPropertyFunctionRule;
pub use join_strategy::JoinStrategyRule;
pub use path_flatten::PathFlattenRule;
pub use property_functions::PropertyFunctionRule;

use crate::op::Op;
use crate::DFResult;
use datafusion_common::tree_node::Transformed;
use parliament_common::QueryResult;
use parliament_index::IndexSet;
use parliament_model::NamedNode;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// What the rewrite rules know about the environment of a query.
#[derive(Debug, Clone, Default)]
pub struct RewriteContext {
    indexes: IndexSet,
    property_functions: FxHashMap<NamedNode, Vec<NamedNode>>,
}

impl RewriteContext {
    /// Creates a new context from the indexes of the queried graph and the registered generic
    /// property functions, given by their URI and the predicates of the triples that describe their
    /// arguments.
    pub fn new(
        indexes: IndexSet,
        property_functions: impl IntoIterator<Item = (NamedNode, Vec<NamedNode>)>,
    ) -> Self {
        Self {
            indexes,
            property_functions: property_functions.into_iter().collect(),
        }
    }

    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// The predicates of the triples describing the arguments of the generic property function
    /// `uri`, or [None] if there is no such function.
    pub fn property_function_operands(&self, uri: &NamedNode) -> Option<&[NamedNode]> {
        self.property_functions.get(uri).map(Vec::as_slice)
    }
}

/// A single rewrite of the operator tree.
pub trait RewriteRule: fmt::Debug + Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &str;

    fn rewrite(&self, op: Op, context: &RewriteContext) -> DFResult<Transformed<Op>>;
}

/// Enables or disables the individual rewrite rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Recognizes calls of property functions that are answered by an index.
    pub index_property_functions: bool,
    /// Recognizes calls of generic property functions.
    pub property_functions: bool,
    /// Splits `&&` in filters into separate expressions.
    pub filter_conjunction: bool,
    /// Expands `?x IN (...)` over a list of constants into a disjunction of equalities, which
    /// becomes a union of substitutions if [Self::filter_disjunction] is enabled. `NOT IN` becomes
    /// one inequality per constant.
    pub expand_one_of: bool,
    /// Turns joins that can stream their left side into sequences.
    pub join_strategy: bool,
    /// Substitutes variables that are compared with an IRI.
    pub filter_equality: bool,
    /// Turns filters with a disjunction of IRI comparisons into a union.
    pub filter_disjunction: bool,
    /// Moves filters to the earliest point at which their variables are bound.
    pub filter_placement: bool,
    /// Turns simple property paths into triple patterns.
    pub path_flatten: bool,
}

impl RewriteOptions {
    /// Disables every rule.
    pub fn none() -> Self {
        Self {
            index_property_functions: false,
            property_functions: false,
            filter_conjunction: false,
            expand_one_of: false,
            join_strategy: false,
            filter_equality: false,
            filter_disjunction: false,
            filter_placement: false,
            path_flatten: false,
        }
    }
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            index_property_functions: true,
            property_functions: true,
            filter_conjunction: true,
            expand_one_of: true,
            join_strategy: true,
            filter_equality: true,
            filter_disjunction: true,
            filter_placement: true,
            path_flatten: true,
        }
    }
}

/// Applies a list of [RewriteRule]s in order.
#[derive(Debug, Clone)]
pub struct Rewriter {
    rules: Vec<Arc<dyn RewriteRule>>,
}

impl Rewriter {
    /// Creates the pipeline of all rules enabled in `options`.
    pub fn new(options: &RewriteOptions) -> Self {
        let mut rules: Vec<Arc<dyn RewriteRule>> = Vec::new();
        if options.index_property_functions {
            rules.push(Arc::new(IndexPropertyFunctionRule::new()));
        }
        if options.property_functions {
            rules.push(Arc::new(PropertyFunctionRule::new()));
        }
        if options.index_property_functions {
            rules.push(Arc::new(IndexPropertyFunctionRule::new()));
        }
        if options.filter_conjunction {
            rules.push(Arc::new(FilterConjunctionRule::new()));
        }
        if options.expand_one_of {
            rules.push(Arc::new(ExpandOneOfRule::new()));
        }
        if options.join_strategy {
            rules.push(Arc::new(JoinStrategyRule::new()));
        }
        if options.filter_equality {
            rules.push(Arc::new(FilterEqualityRule::new()));
        }
        if options.filter_disjunction {
            rules.push(Arc::new(FilterDisjunctionRule::new()));
        }
        if options.filter_placement {
            rules.push(Arc::new(FilterPlacementRule::new()));
        }
        if options.path_flatten {
            rules.push(Arc::new(PathFlattenRule::new()));
        }
        Self { rules }
    }

    pub fn with_rules(rules: Vec<Arc<dyn RewriteRule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Arc<dyn RewriteRule>] {
        &self.rules
    }

    /// Runs every rule once, in order.
    pub fn rewrite(&self, op: Op, context: &RewriteContext) -> QueryResult<Op> {
        let mut op = op;
        for rule in &self.rules {
            let result = rule.rewrite(op, context)?;
            if result.transformed {
                tracing::debug!(rule = rule.name(), plan = %result.data, "Rewrote plan");
            }
            op = result.data;
        }
        Ok(op)
    }
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new(&RewriteOptions::default())
    }
}
