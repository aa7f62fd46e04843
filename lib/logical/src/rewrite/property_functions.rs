use crate::op::Op;
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};
use parliament_model::{
    term_pattern_variable, BasicPattern, NamedNode, NamedNodePattern, TriplePattern,
};

/// Recognizes triples whose predicate is a generic property function and turns them into
/// [Op::PropFunc] calls.
#[derive(Debug, Default)]
pub struct PropertyFunctionRule {}

impl PropertyFunctionRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for PropertyFunctionRule {
    fn name(&self) -> &str {
        "property-functions"
    }

    fn rewrite(&self, op: Op, context: &RewriteContext) -> DFResult<Transformed<Op>> {
        op.transform_up(|op| {
            let Op::Bgp(pattern) = &op else {
                return Ok(Transformed::no(op));
            };
            let calls = split_calls(pattern, |uri| {
                context
                    .property_function_operands(uri)
                    .map(|operands| CallShape {
                        operand_predicates: operands.to_vec(),
                        estimable: true,
                    })
            });
            Ok(match calls {
                Some(calls) => Transformed::yes(calls.build(|inner, call| Op::PropFunc {
                    uri: call.uri,
                    subject: call.triple.subject,
                    object: call.triple.object,
                    pattern: call.dependents,
                    inner: Box::new(inner),
                })),
                None => Transformed::no(op),
            })
        })
    }
}

/// How the triples of a property function call are recognized.
#[derive(Debug, Clone)]
pub(crate) struct CallShape {
    /// Predicates of triples describing an argument of the call.
    pub operand_predicates: Vec<NamedNode>,
    /// Whether the call can estimate its solutions. Calls that can not are evaluated last.
    pub estimable: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub uri: NamedNode,
    pub triple: TriplePattern,
    /// The triples describing the arguments of the call.
    pub dependents: BasicPattern,
    estimable: bool,
}

#[derive(Debug, Clone)]
enum Step {
    Triple(TriplePattern),
    Call(Call),
}

/// A basic graph pattern split into plain triples and property function calls.
#[derive(Debug, Clone)]
pub(crate) struct Calls {
    steps: Vec<Step>,
}

impl Calls {
    /// Builds the operator for the pattern.
    ///
    /// Plain triples are collected into basic graph patterns. Every call wraps the operator built
    /// so far, which provides the input of the call. Calls that can not estimate their solutions
    /// are placed after everything else.
    pub fn build(self, mut call_op: impl FnMut(Op, Call) -> Op) -> Op {
        let mut op = Op::unit();
        let mut current = BasicPattern::new();
        let mut deferred = Vec::new();
        for step in self.steps {
            match step {
                Step::Triple(triple) => current.push(triple),
                Step::Call(call) if !call.estimable => deferred.push(call),
                Step::Call(call) => {
                    if !current.is_empty() {
                        op = Op::sequence(op, Op::Bgp(std::mem::take(&mut current)));
                    }
                    op = call_op(op, call);
                }
            }
        }
        if !current.is_empty() {
            op = Op::sequence(op, Op::Bgp(current));
        }
        for call in deferred {
            op = call_op(op, call);
        }
        op
    }
}

/// Splits `pattern` into property function calls and plain triples.
///
/// `shape` returns the [CallShape] of a predicate that is a property function. Triples that
/// describe an argument of a call, i.e., whose subject is an argument variable and whose predicate
/// is one of the operand predicates of the call, are moved into the call. Returns [None] if the
/// pattern contains no call.
pub(crate) fn split_calls(
    pattern: &[TriplePattern],
    shape: impl Fn(&NamedNode) -> Option<CallShape>,
) -> Option<Calls> {
    let shapes: Vec<Option<CallShape>> = pattern
        .iter()
        .map(|triple| match &triple.predicate {
            NamedNodePattern::NamedNode(uri) => shape(uri),
            NamedNodePattern::Variable(_) => None,
        })
        .collect();
    if shapes.iter().all(Option::is_none) {
        return None;
    }

    let mut is_dependent = vec![false; pattern.len()];
    let mut steps = Vec::with_capacity(pattern.len());
    for (position, (triple, shape)) in pattern.iter().zip(&shapes).enumerate() {
        let (Some(shape), NamedNodePattern::NamedNode(uri)) = (shape, &triple.predicate) else {
            continue;
        };
        let arguments: Vec<_> = term_pattern_variable(&triple.subject)
            .into_iter()
            .chain(term_pattern_variable(&triple.object))
            .collect();
        let mut dependents = BasicPattern::new();
        for (idx, candidate) in pattern.iter().enumerate() {
            if shapes[idx].is_some() {
                continue;
            }
            let describes_argument = term_pattern_variable(&candidate.subject)
                .is_some_and(|subject| arguments.contains(&subject));
            let is_operand = match &candidate.predicate {
                NamedNodePattern::NamedNode(predicate) => {
                    shape.operand_predicates.contains(predicate)
                }
                NamedNodePattern::Variable(_) => false,
            };
            if describes_argument && is_operand {
                is_dependent[idx] = true;
                dependents.push(candidate.clone());
            }
        }
        steps.push((
            position,
            Step::Call(Call {
                uri: uri.clone(),
                triple: triple.clone(),
                dependents,
                estimable: shape.estimable,
            }),
        ));
    }
    for (idx, triple) in pattern.iter().enumerate() {
        if shapes[idx].is_none() && !is_dependent[idx] {
            steps.push((idx, Step::Triple(triple.clone())));
        }
    }
    steps.sort_by_key(|(idx, _)| *idx);
    Some(Calls {
        steps: steps.into_iter().map(|(_, step)| step).collect(),
    })
}
