use crate::op::Op;
use crate::rewrite::property_functions::{split_calls, CallShape};
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};

/// Recognizes calls of property functions that are answered by an index of the queried graph.
///
/// Call triples within a basic graph pattern become [Op::IndexPropFunc] nodes that capture the
/// triples describing their arguments, e.g., `?i pt:asInterval "..."` for a temporal relation. The
/// triples preceding a call become its input so that they bind the arguments before the index is
/// asked. [Op::PropFunc] nodes created by the generic property function rule are converted as
/// well if their function is backed by an index.
///
/// The rule does nothing if the graph has no index.
#[derive(Debug, Default)]
pub struct IndexPropertyFunctionRule {}

impl IndexPropertyFunctionRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for IndexPropertyFunctionRule {
    fn name(&self) -> &str {
        "index-property-functions"
    }

    fn rewrite(&self, op: Op, context: &RewriteContext) -> DFResult<Transformed<Op>> {
        let indexes = context.indexes();
        if indexes.is_empty() {
            return Ok(Transformed::no(op));
        }

        op.transform_up(|op| {
            Ok(match op {
                Op::Bgp(pattern) => {
                    let calls = split_calls(&pattern, |uri| {
                        indexes.property_function(uri).map(|function| CallShape {
                            operand_predicates: function.operand_predicates().to_vec(),
                            estimable: function.is_estimable(),
                        })
                    });
                    match calls {
                        Some(calls) => Transformed::yes(calls.build(|inner, call| {
                            Op::IndexPropFunc {
                                uri: call.uri,
                                subject: call.triple.subject,
                                object: call.triple.object,
                                pattern: call.dependents,
                                inner: Box::new(inner),
                            }
                        })),
                        None => Transformed::no(Op::Bgp(pattern)),
                    }
                }
                Op::PropFunc {
                    uri,
                    subject,
                    object,
                    pattern,
                    inner,
                } if indexes.is_index_function(&uri) => Transformed::yes(Op::IndexPropFunc {
                    uri,
                    subject,
                    object,
                    pattern,
                    inner,
                }),
                op => Transformed::no(op),
            })
        })
    }
}
