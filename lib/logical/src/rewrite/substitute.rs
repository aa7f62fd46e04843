use crate::op::{substitute_expression, Op};
use parliament_model::{substitute_pattern, substitute_term, Binding, Expression, Term, Variable};

/// Returns true if every variable of `op` can be replaced by a constant without changing the
/// meaning of `op` apart from the variable no longer being bound.
pub(crate) fn is_substitutable(op: &Op) -> bool {
    match op {
        Op::Bgp(_) | Op::Path { .. } => true,
        Op::Sequence(elements) => elements.iter().all(is_substitutable),
        Op::Join { left, right } | Op::Union { left, right } => {
            is_substitutable(left) && is_substitutable(right)
        }
        Op::Filter { inner, .. } | Op::PropFunc { inner, .. } | Op::IndexPropFunc { inner, .. } => {
            is_substitutable(inner)
        }
        _ => false,
    }
}

pub(crate) fn term_expression(term: &Term) -> Option<Expression> {
    match term {
        Term::NamedNode(node) => Some(Expression::NamedNode(node.clone())),
        Term::Literal(literal) => Some(Expression::Literal(literal.clone())),
        Term::BlankNode(_) => None,
    }
}

/// Replaces `variable` by `term` in `op`. `op` must be [substitutable](is_substitutable).
pub(crate) fn substitute(op: Op, variable: &Variable, term: &Term) -> Op {
    let binding = Binding::new().extended(variable.clone(), term.clone());
    substitute_binding(op, &binding, variable, term)
}

fn substitute_binding(op: Op, binding: &Binding, variable: &Variable, term: &Term) -> Op {
    let recurse = |op: Op| substitute_binding(op, binding, variable, term);
    let boxed = |op: Box<Op>| Box::new(substitute_binding(*op, binding, variable, term));
    match op {
        Op::Bgp(pattern) => Op::Bgp(substitute_pattern(&pattern, binding)),
        Op::Path {
            subject,
            path,
            object,
        } => Op::Path {
            subject: substitute_term(&subject, binding),
            path,
            object: substitute_term(&object, binding),
        },
        Op::Sequence(elements) => Op::Sequence(elements.into_iter().map(recurse).collect()),
        Op::Join { left, right } => Op::Join {
            left: boxed(left),
            right: boxed(right),
        },
        Op::Union { left, right } => Op::Union {
            left: boxed(left),
            right: boxed(right),
        },
        Op::Filter { expressions, inner } => {
            let expressions = match term_expression(term) {
                Some(value) => expressions
                    .iter()
                    .map(|expression| substitute_expression(expression, variable, &value))
                    .collect(),
                None => expressions,
            };
            Op::Filter {
                expressions,
                inner: boxed(inner),
            }
        }
        Op::PropFunc {
            uri,
            subject,
            object,
            pattern,
            inner,
        } => Op::PropFunc {
            uri,
            subject: substitute_term(&subject, binding),
            object: substitute_term(&object, binding),
            pattern: substitute_pattern(&pattern, binding),
            inner: boxed(inner),
        },
        Op::IndexPropFunc {
            uri,
            subject,
            object,
            pattern,
            inner,
        } => Op::IndexPropFunc {
            uri,
            subject: substitute_term(&subject, binding),
            object: substitute_term(&object, binding),
            pattern: substitute_pattern(&pattern, binding),
            inner: boxed(inner),
        },
        op => op,
    }
}
