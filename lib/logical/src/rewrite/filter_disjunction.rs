use crate::op::{disjuncts, Op};
use crate::rewrite::filter_equality::equality;
use crate::rewrite::substitute::{is_substitutable, substitute, term_expression};
use crate::rewrite::{RewriteContext, RewriteRule};
use crate::DFResult;
use datafusion_common::tree_node::{Transformed, TreeNode};
use parliament_model::{Expression, Term, Variable};

/// Turns a filter over a disjunction of equalities into a union.
///
/// `FILTER(?x = <a> || ?x = <b>)` becomes the union of the filtered pattern with `?x` substituted
/// by `<a>` and by `<b>`. Every branch binds `?x` to its constant with an [Op::Extend]. All
/// disjuncts must compare the same variable with distinct constants.
#[derive(Debug, Default)]
pub struct FilterDisjunctionRule {}

impl FilterDisjunctionRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for FilterDisjunctionRule {
    fn name(&self) -> &str {
        "filter-disjunction"
    }

    fn rewrite(&self, op: Op, _context: &RewriteContext) -> DFResult<Transformed<Op>> {
        op.transform_up(|op| {
            let Op::Filter { expressions, inner } = op else {
                return Ok(Transformed::no(op));
            };
            let candidate = is_substitutable(&inner)
                .then(|| {
                    expressions.iter().enumerate().find_map(|(idx, expression)| {
                        alternatives(expression)
                            .filter(|(variable, _)| inner.fixed_variables().contains(variable))
                            .map(|alternatives| (idx, alternatives))
                    })
                })
                .flatten();
            let Some((idx, (variable, terms))) = candidate else {
                return Ok(Transformed::no(Op::Filter { expressions, inner }));
            };

            let branches = terms.into_iter().filter_map(|term| {
                let value = term_expression(&term)?;
                let branch = substitute(inner.as_ref().clone(), &variable, &term);
                Some(Op::extend(branch, variable.clone(), value))
            });
            let Some(union) = branches.reduce(Op::union) else {
                return Ok(Transformed::no(Op::Filter { expressions, inner }));
            };
            let remaining = expressions
                .into_iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, expression)| expression)
                .collect();
            Ok(Transformed::yes(Op::filter(remaining, union)))
        })
    }
}

/// Returns the variable and the constants of a disjunction of equalities.
fn alternatives(expression: &Expression) -> Option<(Variable, Vec<Term>)> {
    let disjuncts = disjuncts(expression);
    if disjuncts.len() < 2 {
        return None;
    }
    let mut variable: Option<Variable> = None;
    let mut terms: Vec<Term> = Vec::with_capacity(disjuncts.len());
    for disjunct in disjuncts {
        let (v, term) = equality(disjunct)?;
        if variable.as_ref().is_some_and(|variable| *variable != v) || terms.contains(&term) {
            return None;
        }
        variable = Some(v);
        terms.push(term);
    }
    Some((variable?, terms))
}
