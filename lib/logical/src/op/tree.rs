use crate::op::Op;
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode, TreeNodeIterator, TreeNodeRecursion};

impl Op {
    /// Returns the direct inputs of this operator.
    pub fn inputs(&self) -> Vec<&Op> {
        match self {
            Self::Bgp(_) | Self::Path { .. } | Self::Table { .. } => Vec::new(),
            Self::Sequence(elements) => elements.iter().collect(),
            Self::Join { left, right }
            | Self::LeftJoin { left, right, .. }
            | Self::Conditional { left, right }
            | Self::Union { left, right }
            | Self::Minus { left, right } => vec![left, right],
            Self::Filter { inner, .. }
            | Self::Graph { inner, .. }
            | Self::Extend { inner, .. }
            | Self::PropFunc { inner, .. }
            | Self::IndexPropFunc { inner, .. }
            | Self::OrderBy { inner, .. }
            | Self::Project { inner, .. }
            | Self::Distinct { inner }
            | Self::Reduced { inner }
            | Self::Slice { inner, .. } => vec![inner],
        }
    }
}

impl TreeNode for Op {
    fn apply_children<'n, F: FnMut(&'n Self) -> DFResult<TreeNodeRecursion>>(
        &'n self,
        f: F,
    ) -> DFResult<TreeNodeRecursion> {
        self.inputs().into_iter().apply_until_stop(f)
    }

    fn map_children<F: FnMut(Self) -> DFResult<Transformed<Self>>>(
        self,
        mut f: F,
    ) -> DFResult<Transformed<Self>> {
        let f = &mut f;
        Ok(match self {
            op @ (Self::Bgp(_) | Self::Path { .. } | Self::Table { .. }) => Transformed::no(op),
            Self::Sequence(elements) => elements
                .into_iter()
                .map_until_stop_and_collect(f)?
                .update_data(Self::Sequence),
            Self::Join { left, right } => {
                map_pair(left, right, f)?.update_data(|(left, right)| Self::Join { left, right })
            }
            Self::LeftJoin {
                left,
                right,
                expression,
            } => map_pair(left, right, f)?.update_data(|(left, right)| Self::LeftJoin {
                left,
                right,
                expression,
            }),
            Self::Conditional { left, right } => map_pair(left, right, f)?
                .update_data(|(left, right)| Self::Conditional { left, right }),
            Self::Union { left, right } => {
                map_pair(left, right, f)?.update_data(|(left, right)| Self::Union { left, right })
            }
            Self::Minus { left, right } => {
                map_pair(left, right, f)?.update_data(|(left, right)| Self::Minus { left, right })
            }
            Self::Filter { expressions, inner } => {
                map_input(inner, f)?.update_data(|inner| Self::Filter { expressions, inner })
            }
            Self::Graph { name, inner } => {
                map_input(inner, f)?.update_data(|inner| Self::Graph { name, inner })
            }
            Self::Extend {
                inner,
                variable,
                expression,
            } => map_input(inner, f)?.update_data(|inner| Self::Extend {
                inner,
                variable,
                expression,
            }),
            Self::PropFunc {
                uri,
                subject,
                object,
                pattern,
                inner,
            } => map_input(inner, f)?.update_data(|inner| Self::PropFunc {
                uri,
                subject,
                object,
                pattern,
                inner,
            }),
            Self::IndexPropFunc {
                uri,
                subject,
                object,
                pattern,
                inner,
            } => map_input(inner, f)?.update_data(|inner| Self::IndexPropFunc {
                uri,
                subject,
                object,
                pattern,
                inner,
            }),
            Self::OrderBy { inner, expressions } => {
                map_input(inner, f)?.update_data(|inner| Self::OrderBy { inner, expressions })
            }
            Self::Project { inner, variables } => {
                map_input(inner, f)?.update_data(|inner| Self::Project { inner, variables })
            }
            Self::Distinct { inner } => {
                map_input(inner, f)?.update_data(|inner| Self::Distinct { inner })
            }
            Self::Reduced { inner } => {
                map_input(inner, f)?.update_data(|inner| Self::Reduced { inner })
            }
            Self::Slice {
                inner,
                start,
                length,
            } => map_input(inner, f)?.update_data(|inner| Self::Slice {
                inner,
                start,
                length,
            }),
        })
    }
}

fn map_input<F: FnMut(Op) -> DFResult<Transformed<Op>>>(
    input: Box<Op>,
    f: &mut F,
) -> DFResult<Transformed<Box<Op>>> {
    Ok(f(*input)?.update_data(Box::new))
}

/// Maps the inputs of a binary operator. The right input is not visited if the visit of the left
/// input stopped the traversal.
fn map_pair<F: FnMut(Op) -> DFResult<Transformed<Op>>>(
    left: Box<Op>,
    right: Box<Op>,
    f: &mut F,
) -> DFResult<Transformed<(Box<Op>, Box<Op>)>> {
    map_input(left, f)?
        .update_data(|left| (left, right))
        .transform_sibling(|(left, right)| {
            Ok(map_input(right, f)?.update_data(|right| (left, right)))
        })
}
