use crate::op::{conjuncts, Op};
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};
use parliament_model::Expression;

/// Splits the conjunctions of a filter into a list of expressions so that later rules can move
/// every expression on its own.
#[derive(Debug, Default)]
pub struct FilterConjunctionRule {}

impl FilterConjunctionRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for FilterConjunctionRule {
    fn name(&self) -> &str {
        "filter-conjunction"
    }

    fn rewrite(&self, op: Op, _context: &RewriteContext) -> DFResult<Transformed<Op>> {
        op.transform_up(|op| {
            Ok(match op {
                Op::Filter { expressions, inner }
                    if expressions
                        .iter()
                        .any(|expression| matches!(expression, Expression::And(..))) =>
                {
                    Transformed::yes(Op::Filter {
                        expressions: expressions.into_iter().flat_map(conjuncts).collect(),
                        inner,
                    })
                }
                op => Transformed::no(op),
            })
        })
    }
}
