use crate::join::{is_linear, is_linear_left_join};
use crate::op::Op;
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};

/// Marks joins that can stream their left side into their right side.
///
/// A linear join becomes an [Op::Sequence] and a linear left join becomes an [Op::Conditional]
/// whose right side is filtered by the expression of the left join. All other joins are left as
/// they are and are evaluated by joining the independently evaluated sides.
#[derive(Debug, Default)]
pub struct JoinStrategyRule {}

impl JoinStrategyRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for JoinStrategyRule {
    fn name(&self) -> &str {
        "join-strategy"
    }

    fn rewrite(&self, op: Op, _context: &RewriteContext) -> DFResult<Transformed<Op>> {
        op.transform_up(|op| {
            Ok(match op {
                Op::Join { left, right } if is_linear(&left, &right) => {
                    Transformed::yes(Op::sequence(*left, *right))
                }
                Op::LeftJoin {
                    left,
                    right,
                    expression,
                } if is_linear_left_join(&left, &right, expression.as_ref()) => {
                    Transformed::yes(Op::Conditional {
                        left,
                        right: Box::new(Op::filter(expression.into_iter().collect(), *right)),
                    })
                }
                op => Transformed::no(op),
            })
        })
    }
}
