use crate::op::{expression_variables, Op};
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};
use parliament_model::{triple_variables, BasicPattern, Expression, TriplePattern, Variable};

/// Moves every filter expression directly after the triple or operator that binds its last
/// variable.
///
/// Filters over a basic graph pattern or a sequence split the pattern so that solutions are
/// dropped as early as possible. A filter over an optional is moved into the mandatory side if the
/// mandatory side binds all of its variables. Expressions without variables are evaluated before
/// anything else. Expressions whose variables are never certainly bound, or that contain `EXISTS`,
/// stay on top.
#[derive(Debug, Default)]
pub struct FilterPlacementRule {}

impl FilterPlacementRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for FilterPlacementRule {
    fn name(&self) -> &str {
        "filter-placement"
    }

    fn rewrite(&self, op: Op, _context: &RewriteContext) -> DFResult<Transformed<Op>> {
        op.transform_up(|op| {
            let Op::Filter { expressions, inner } = &op else {
                return Ok(Transformed::no(op));
            };
            let placed = place(expressions.clone(), inner.as_ref().clone());
            Ok(if placed == op {
                Transformed::no(op)
            } else {
                Transformed::yes(placed)
            })
        })
    }
}

fn place(expressions: Vec<Expression>, op: Op) -> Op {
    match op {
        Op::Bgp(pattern) => {
            let mut placer = Placer::new(expressions);
            placer.add_triples(pattern);
            placer.finish()
        }
        Op::Sequence(elements) => {
            let mut placer = Placer::new(expressions);
            for element in elements {
                match element {
                    Op::Bgp(pattern) => placer.add_triples(pattern),
                    element => placer.add_op(element),
                }
            }
            placer.finish()
        }
        Op::Conditional { left, right } => {
            let fixed = left.fixed_variables();
            let (inside, outside): (Vec<_>, Vec<_>) =
                expressions.into_iter().partition(|expression| {
                    expression_variables(expression)
                        .is_some_and(|variables| variables.iter().all(|v| fixed.contains(v)))
                });
            let conditional = if inside.is_empty() {
                Op::Conditional { left, right }
            } else {
                Op::Conditional {
                    left: Box::new(place(inside, *left)),
                    right,
                }
            };
            Op::filter(outside, conditional)
        }
        op => Op::filter(expressions, op),
    }
}

/// Builds the filtered operator step by step while tracking the certainly bound variables.
struct Placer {
    op: Op,
    current: BasicPattern,
    scope: Vec<Variable>,
    pending: Vec<(Expression, Vec<Variable>)>,
    unplaceable: Vec<Expression>,
}

impl Placer {
    fn new(expressions: Vec<Expression>) -> Self {
        let mut constants = Vec::new();
        let mut pending = Vec::new();
        let mut unplaceable = Vec::new();
        for expression in expressions {
            match expression_variables(&expression) {
                Some(variables) if variables.is_empty() => constants.push(expression),
                Some(variables) => pending.push((expression, variables)),
                None => unplaceable.push(expression),
            }
        }
        Self {
            op: Op::filter(constants, Op::unit()),
            current: BasicPattern::new(),
            scope: Vec::new(),
            pending,
            unplaceable,
        }
    }

    fn add_triples(&mut self, pattern: Vec<TriplePattern>) {
        for triple in pattern {
            self.scope.extend(triple_variables(&triple).cloned());
            self.current.push(triple);
            self.place_ready();
        }
    }

    fn add_op(&mut self, op: Op) {
        self.flush();
        self.scope.extend(op.fixed_variables());
        self.op = Op::sequence(std::mem::replace(&mut self.op, Op::unit()), op);
        self.place_ready();
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let pattern = Op::Bgp(std::mem::take(&mut self.current));
            self.op = Op::sequence(std::mem::replace(&mut self.op, Op::unit()), pattern);
        }
    }

    fn place_ready(&mut self) {
        let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(_, variables)| variables.iter().all(|v| self.scope.contains(v)));
        self.pending = pending;
        if ready.is_empty() {
            return;
        }
        self.flush();
        let op = std::mem::replace(&mut self.op, Op::unit());
        self.op = Op::filter(ready.into_iter().map(|(expression, _)| expression).collect(), op);
    }

    fn finish(mut self) -> Op {
        self.flush();
        let remaining = self
            .pending
            .into_iter()
            .map(|(expression, _)| expression)
            .chain(self.unplaceable)
            .collect();
        Op::filter(remaining, self.op)
    }
}
