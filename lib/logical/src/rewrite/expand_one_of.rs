use crate::op::{is_constant, Op};
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};
use parliament_model::Expression;

/// Expands `?x IN (a, b)` into `?x = a || ?x = b` and `?x NOT IN (a, b)` into the separate filter
/// expressions `!(?x = a)` and `!(?x = b)`.
///
/// The disjunction is then turned into a union of substitutions by the
/// [FilterDisjunctionRule](crate::rewrite::FilterDisjunctionRule). Only top-level expressions of a
/// filter whose list is a non-empty list of constants are expanded.
#[derive(Debug, Default)]
pub struct ExpandOneOfRule {}

impl ExpandOneOfRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for ExpandOneOfRule {
    fn name(&self) -> &str {
        "expand-one-of"
    }

    fn rewrite(&self, op: Op, _context: &RewriteContext) -> DFResult<Transformed<Op>> {
        op.transform_up(|op| {
            let Op::Filter { expressions, inner } = op else {
                return Ok(Transformed::no(op));
            };
            let mut changed = false;
            let mut result = Vec::with_capacity(expressions.len());
            for expression in expressions {
                match expression {
                    Expression::In(lhs, list) if is_constant_list(&list) => {
                        changed = true;
                        result.push(one_of(&lhs, list));
                    }
                    Expression::Not(inner) => match *inner {
                        Expression::In(lhs, list) if is_constant_list(&list) => {
                            changed = true;
                            result.extend(list.into_iter().map(|value| {
                                Expression::Not(Box::new(Expression::Equal(
                                    lhs.clone(),
                                    Box::new(value),
                                )))
                            }));
                        }
                        inner => result.push(Expression::Not(Box::new(inner))),
                    },
                    expression => result.push(expression),
                }
            }
            let op = Op::Filter {
                expressions: result,
                inner,
            };
            Ok(if changed {
                Transformed::yes(op)
            } else {
                Transformed::no(op)
            })
        })
    }
}

fn one_of(lhs: &Expression, list: Vec<Expression>) -> Expression {
    list.into_iter()
        .map(|value| Expression::Equal(Box::new(lhs.clone()), Box::new(value)))
        .reduce(|acc, next| Expression::Or(Box::new(acc), Box::new(next)))
        .unwrap_or_else(|| Expression::In(Box::new(lhs.clone()), Vec::new()))
}

fn is_constant_list(list: &[Expression]) -> bool {
    !list.is_empty() && list.iter().all(is_constant)
}
