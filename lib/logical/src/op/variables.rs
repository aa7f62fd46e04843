use crate::op::Op;
use itertools::Itertools;
use parliament_model::{
    named_node_pattern_variable, pattern_variables, term_pattern_variable, Variable,
};

impl Op {
    /// Returns the variables that may be bound by the solutions of this operator, in order of first
    /// appearance.
    pub fn variables(&self) -> Vec<Variable> {
        self.collect(false)
    }

    /// Returns the variables that are bound in every solution of this operator.
    pub fn fixed_variables(&self) -> Vec<Variable> {
        self.collect(true)
    }

    fn collect(&self, fixed: bool) -> Vec<Variable> {
        let variables = match self {
            Op::Bgp(pattern) => pattern_variables(pattern),
            Op::Path {
                subject, object, ..
            } => term_pattern_variable(subject)
                .into_iter()
                .chain(term_pattern_variable(object))
                .cloned()
                .collect(),
            Op::Table { variables, rows } => {
                if fixed {
                    variables
                        .iter()
                        .filter(|variable| rows.iter().all(|row| row.contains(variable)))
                        .cloned()
                        .collect()
                } else {
                    variables.clone()
                }
            }
            Op::Join { left, right } => concat(left.collect(fixed), right.collect(fixed)),
            Op::Sequence(elements) => elements
                .iter()
                .flat_map(|element| element.collect(fixed))
                .collect(),
            Op::LeftJoin { left, right, .. } | Op::Conditional { left, right } => {
                if fixed {
                    left.collect(true)
                } else {
                    concat(left.collect(false), right.collect(false))
                }
            }
            Op::Union { left, right } => {
                if fixed {
                    let right = right.collect(true);
                    left.collect(true)
                        .into_iter()
                        .filter(|variable| right.contains(variable))
                        .collect()
                } else {
                    concat(left.collect(false), right.collect(false))
                }
            }
            Op::Minus { left, .. } => left.collect(fixed),
            Op::Graph { name, inner } => named_node_pattern_variable(name)
                .cloned()
                .into_iter()
                .chain(inner.collect(fixed))
                .collect(),
            Op::Extend {
                inner, variable, ..
            } => {
                let mut result = inner.collect(fixed);
                if !fixed {
                    result.push(variable.clone());
                }
                result
            }
            Op::PropFunc {
                subject,
                object,
                pattern,
                inner,
                ..
            }
            | Op::IndexPropFunc {
                subject,
                object,
                pattern,
                inner,
                ..
            } => {
                let mut result = inner.collect(fixed);
                result.extend(
                    term_pattern_variable(subject)
                        .into_iter()
                        .chain(term_pattern_variable(object))
                        .cloned(),
                );
                result.extend(pattern_variables(pattern));
                result
            }
            Op::Project { inner, variables } => {
                let inner = inner.collect(fixed);
                variables
                    .iter()
                    .filter(|variable| inner.contains(variable))
                    .cloned()
                    .collect()
            }
            Op::Filter { inner, .. }
            | Op::OrderBy { inner, .. }
            | Op::Distinct { inner }
            | Op::Reduced { inner }
            | Op::Slice { inner, .. } => inner.collect(fixed),
        };
        variables.into_iter().unique().collect()
    }
}

fn concat(mut left: Vec<Variable>, right: Vec<Variable>) -> Vec<Variable> {
    left.extend(right);
    left
}
