use parliament_common::error::IndexError;
use parliament_common::{BindingIter, CancellationFlag, QueryResult};
use parliament_model::{Binding, NamedNode, Term, TermPattern, TriplePattern};
use std::ops::Bound;

/// Answers the triple patterns of a basic graph pattern that an index can handle on its own.
pub trait IndexPatternQuerier: Send + Sync {
    /// Returns the triples of `pattern` that this querier can answer.
    fn examine(&self, pattern: &[TriplePattern]) -> Vec<TriplePattern>;

    /// Estimates the number of solutions of `pattern`, or `-1` if unknown.
    fn estimate(&self, pattern: &[TriplePattern]) -> i64;

    /// Evaluates `pattern` for one incoming `binding`. Every solution extends `binding`.
    fn query(&self, pattern: &[TriplePattern], binding: &Binding) -> QueryResult<BindingIter<'static>>;
}

/// A property function `?subject <uri> ?object` that is answered by an index.
pub trait IndexPropertyFunction: Send + Sync {
    fn uri(&self) -> &NamedNode;

    /// The label of the index backing this function.
    fn index_label(&self) -> &str;

    /// The predicates of the triples that describe an argument of this function, e.g., the literal
    /// holding an interval. The rewriter moves such triples into the pattern of the function call.
    fn operand_predicates(&self) -> &[NamedNode];

    /// Whether [PreparedCall::estimate] is meaningful for this function.
    fn is_estimable(&self) -> bool {
        true
    }

    /// Resolves the arguments of a call.
    ///
    /// `subject` and `object` already have the variables of the incoming binding substituted.
    /// `pattern` contains the triples that describe the arguments. The returned call reports which
    /// of them it consumed while resolving the arguments.
    fn prepare(
        &self,
        subject: &TermPattern,
        object: &TermPattern,
        pattern: &[TriplePattern],
        cancellation: &CancellationFlag,
    ) -> QueryResult<Box<dyn PreparedCall>>;
}

/// A property function call whose arguments have been resolved.
pub trait PreparedCall: Send {
    /// The triples of the function pattern that were used to resolve the arguments. They must not
    /// be evaluated against the base graph.
    fn consumed(&self) -> &[TriplePattern];

    /// Estimates the number of solutions, or `-1` if unknown.
    fn estimate(&self) -> i64;

    /// Evaluates the call for `binding`. Every solution extends `binding`.
    fn execute(&self, binding: &Binding) -> QueryResult<BindingIter<'static>>;
}

/// Answers range filters over the objects of a numeric predicate.
pub trait RangeSource: Send + Sync {
    fn predicate(&self) -> &NamedNode;

    /// Returns the subjects whose value lies within the bounds.
    ///
    /// The result may be a superset of the exact answer. Callers always re-apply the filter.
    fn subjects_in_range(
        &self,
        lower: Bound<f64>,
        upper: Bound<f64>,
    ) -> Result<Box<dyn Iterator<Item = Term> + Send>, IndexError>;
}
