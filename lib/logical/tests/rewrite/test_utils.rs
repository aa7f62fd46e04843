use parliament_common::QueryResult;
use parliament_index::IndexSet;
use parliament_logical::rewrite::{RewriteContext, RewriteRule, Rewriter};
use parliament_logical::Op;
use parliament_model::{Expression, NamedNode, TermPattern, TriplePattern, Variable};
use std::sync::Arc;

pub fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

pub fn iri(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://ex/{local}"))
}

pub fn var_expr(name: &str) -> Expression {
    Expression::Variable(var(name))
}

pub fn iri_expr(local: &str) -> Expression {
    Expression::NamedNode(iri(local))
}

pub fn eq(lhs: Expression, rhs: Expression) -> Expression {
    Expression::Equal(Box::new(lhs), Box::new(rhs))
}

/// A triple with variable subject and object, e.g., `triple("s", "name", "n")`.
pub fn triple(subject: &str, predicate: &str, object: &str) -> TriplePattern {
    triple_of(var(subject), predicate, var(object))
}

pub fn triple_of(
    subject: impl Into<TermPattern>,
    predicate: &str,
    object: impl Into<TermPattern>,
) -> TriplePattern {
    TriplePattern {
        subject: subject.into(),
        predicate: iri(predicate).into(),
        object: object.into(),
    }
}

/// Rewrites `op` with the given rules and no indexes.
pub fn rewrite_with(op: Op, rules: Vec<Arc<dyn RewriteRule>>) -> QueryResult<Op> {
    Rewriter::with_rules(rules).rewrite(op, &RewriteContext::default())
}

/// Rewrites `op` with every rule enabled. `functions` are the local names of the registered
/// generic property functions.
pub fn rewrite_all(op: Op, functions: &[&str]) -> QueryResult<Op> {
    let context = RewriteContext::new(
        IndexSet::empty(),
        functions.iter().map(|function| (iri(function), Vec::new())),
    );
    Rewriter::default().rewrite(op, &context)
}
