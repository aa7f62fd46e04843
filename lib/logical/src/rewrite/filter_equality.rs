use crate::op::Op;
use crate::rewrite::substitute::{is_substitutable, substitute, term_expression};
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};
use parliament_model::{Expression, Term, Variable};

/// Replaces variables that a filter compares with a constant by the constant.
///
/// `FILTER(?x = <iri>)` and `FILTER(sameTerm(?x, const))` are removed and `?x` is substituted in
/// the filtered pattern. An [Op::Extend] binds `?x` to the constant afterward. Equality with a
/// literal is only handled for `sameTerm`, as `=` compares literals by value.
///
/// The variable must be bound in every solution of the pattern and the pattern must only consist
/// of operators in which a variable can be replaced by a constant.
#[derive(Debug, Default)]
pub struct FilterEqualityRule {}

impl FilterEqualityRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for FilterEqualityRule {
    fn name(&self) -> &str {
        "filter-equality"
    }

    fn rewrite(&self, op: Op, _context: &RewriteContext) -> DFResult<Transformed<Op>> {
        op.transform_up(|op| {
            let Op::Filter { expressions, inner } = op else {
                return Ok(Transformed::no(op));
            };
            let mut inner = *inner;
            let mut remaining = Vec::with_capacity(expressions.len());
            let mut extensions = Vec::new();
            for expression in expressions {
                match equality(&expression) {
                    Some((variable, term))
                        if is_substitutable(&inner)
                            && inner.fixed_variables().contains(&variable) =>
                    {
                        inner = substitute(inner, &variable, &term);
                        extensions.push((variable, term));
                    }
                    _ => remaining.push(expression),
                }
            }
            if extensions.is_empty() {
                return Ok(Transformed::no(Op::Filter {
                    expressions: remaining,
                    inner: Box::new(inner),
                }));
            }
            for (variable, term) in extensions {
                if let Some(value) = term_expression(&term) {
                    inner = Op::extend(inner, variable, value);
                }
            }
            Ok(Transformed::yes(Op::filter(remaining, inner)))
        })
    }
}

/// Returns the variable and the constant of an equality that can be substituted.
pub(crate) fn equality(expression: &Expression) -> Option<(Variable, Term)> {
    match expression {
        Expression::Equal(lhs, rhs) => match (lhs.as_ref(), rhs.as_ref()) {
            (Expression::Variable(variable), Expression::NamedNode(node))
            | (Expression::NamedNode(node), Expression::Variable(variable)) => {
                Some((variable.clone(), node.clone().into()))
            }
            _ => None,
        },
        Expression::SameTerm(lhs, rhs) => match (lhs.as_ref(), rhs.as_ref()) {
            (Expression::Variable(variable), Expression::NamedNode(node))
            | (Expression::NamedNode(node), Expression::Variable(variable)) => {
                Some((variable.clone(), node.clone().into()))
            }
            (Expression::Variable(variable), Expression::Literal(literal))
            | (Expression::Literal(literal), Expression::Variable(variable)) => {
                Some((variable.clone(), literal.clone().into()))
            }
            _ => None,
        },
        _ => None,
    }
}
