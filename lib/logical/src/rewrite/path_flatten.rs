use crate::op::Op;
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};
use parliament_model::{anonymous_variable, PropertyPathExpression, TermPattern, TriplePattern};

/// Turns property paths that match exactly one triple per step into triple patterns.
///
/// `?s <p> ?o` and `?s ^<p> ?o` become a single triple. A sequence `?s <p>/<q> ?o` becomes a chain
/// of triples joined by fresh anonymous variables. Alternatives, repetitions and negated property
/// sets are kept as paths.
#[derive(Debug, Default)]
pub struct PathFlattenRule {}

impl PathFlattenRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for PathFlattenRule {
    fn name(&self) -> &str {
        "path-flatten"
    }

    fn rewrite(&self, op: Op, _context: &RewriteContext) -> DFResult<Transformed<Op>> {
        let mut counter = 0;
        op.transform_up(|op| {
            Ok(match op {
                Op::Path {
                    subject,
                    path,
                    object,
                } if is_flattenable(&path) => {
                    let steps = flatten(&subject, &path, &object, &mut counter);
                    Transformed::yes(steps.into_iter().fold(Op::unit(), append))
                }
                op => Transformed::no(op),
            })
        })
    }
}

fn is_flattenable(path: &PropertyPathExpression) -> bool {
    match path {
        PropertyPathExpression::NamedNode(_) | PropertyPathExpression::Sequence(..) => true,
        PropertyPathExpression::Reverse(inner) => is_flattenable(inner),
        _ => false,
    }
}

fn flatten(
    subject: &TermPattern,
    path: &PropertyPathExpression,
    object: &TermPattern,
    counter: &mut usize,
) -> Vec<Op> {
    match path {
        PropertyPathExpression::NamedNode(predicate) => vec![Op::Bgp(vec![TriplePattern {
            subject: subject.clone(),
            predicate: predicate.clone().into(),
            object: object.clone(),
        }])],
        PropertyPathExpression::Reverse(inner) => flatten(object, inner, subject, counter),
        PropertyPathExpression::Sequence(first, second) => {
            let middle: TermPattern = anonymous_variable(&format!("path{counter}")).into();
            *counter += 1;
            let mut steps = flatten(subject, first, &middle, counter);
            steps.extend(flatten(&middle, second, object, counter));
            steps
        }
        path => vec![Op::Path {
            subject: subject.clone(),
            path: path.clone(),
            object: object.clone(),
        }],
    }
}

/// Appends `op` to `sequence`, merging adjacent basic graph patterns.
fn append(sequence: Op, op: Op) -> Op {
    match (sequence, op) {
        (Op::Bgp(mut left), Op::Bgp(right)) => {
            left.extend(right);
            Op::Bgp(left)
        }
        (Op::Sequence(mut elements), Op::Bgp(right)) => {
            if let Some(Op::Bgp(left)) = elements.last_mut() {
                left.extend(right);
            } else {
                elements.push(Op::Bgp(right));
            }
            Op::Sequence(elements)
        }
        (sequence, op) => Op::sequence(sequence, op),
    }
}
