use crate::op::{expression_variables, Op};
use parliament_model::{Expression, Variable};

/// Returns true if the join of `left` and `right` can be evaluated by streaming every solution of
/// `left` into `right`.
///
/// Streaming substitutes the variables bound by the left side into the right side. This changes the
/// result if the right side refers to such a variable in a place where it is not bound by the right
/// side itself, e.g., in a filter, in an optional part, or in a nested scope like a sub-select.
pub fn is_linear(left: &Op, right: &Op) -> bool {
    let left_variables = left.variables();
    is_safe_to_stream(right, &left_variables)
}

/// Left joins follow the same rules as joins. The filter of the left join sees the merged solution
/// in both strategies, so only filters containing `EXISTS` prevent streaming.
pub fn is_linear_left_join(left: &Op, right: &Op, expression: Option<&Expression>) -> bool {
    is_safe_to_stream(right, &left.variables())
        && expression.map_or(true, |expression| expression_variables(expression).is_some())
}

fn is_safe_to_stream(op: &Op, outer: &[Variable]) -> bool {
    match op {
        Op::Bgp(_) | Op::Path { .. } | Op::Table { .. } => true,
        Op::PropFunc { inner, .. } | Op::IndexPropFunc { inner, .. } | Op::Graph { inner, .. } => {
            is_safe_to_stream(inner, outer)
        }
        Op::Sequence(elements) => elements
            .iter()
            .all(|element| is_safe_to_stream(element, outer)),
        Op::Join { left, right } | Op::Union { left, right } => {
            is_safe_to_stream(left, outer) && is_safe_to_stream(right, outer)
        }
        Op::Filter { expressions, inner } => {
            let fixed = inner.fixed_variables();
            is_safe_to_stream(inner, outer)
                && expressions
                    .iter()
                    .all(|expression| is_filter_safe(expression, &fixed, outer))
        }
        Op::LeftJoin {
            left,
            right,
            expression,
        } => {
            let fixed = left.fixed_variables();
            is_safe_to_stream(left, outer)
                && is_safe_to_stream(right, outer)
                && !has_optional_outer_variable(left, right, outer)
                && expression.as_ref().map_or(true, |expression| {
                    is_filter_safe(expression, &concat(&fixed, right), outer)
                })
        }
        Op::Conditional { left, right } => {
            is_safe_to_stream(left, outer)
                && is_safe_to_stream(right, outer)
                && !has_optional_outer_variable(left, right, outer)
        }
        Op::Extend {
            inner,
            variable,
            expression,
        } => {
            is_safe_to_stream(inner, outer)
                && !outer.contains(variable)
                && is_filter_safe(expression, &inner.fixed_variables(), outer)
        }
        Op::Minus { .. }
        | Op::Project { .. }
        | Op::Distinct { .. }
        | Op::Reduced { .. }
        | Op::Slice { .. }
        | Op::OrderBy { .. } => op
            .variables()
            .iter()
            .all(|variable| !outer.contains(variable)),
    }
}

/// An expression is safe if every outer variable it mentions is certainly bound at the place it
/// is evaluated.
fn is_filter_safe(expression: &Expression, fixed: &[Variable], outer: &[Variable]) -> bool {
    let Some(variables) = expression_variables(expression) else {
        return false;
    };
    variables
        .iter()
        .all(|variable| !outer.contains(variable) || fixed.contains(variable))
}

fn has_optional_outer_variable(left: &Op, right: &Op, outer: &[Variable]) -> bool {
    let fixed = left.fixed_variables();
    right
        .variables()
        .iter()
        .any(|variable| !fixed.contains(variable) && outer.contains(variable))
}

fn concat(fixed: &[Variable], right: &Op) -> Vec<Variable> {
    let mut result = fixed.to_vec();
    result.extend(right.fixed_variables());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use parliament_model::{Literal, NamedNode, TriplePattern};

    fn triple(subject: &str, object: &str) -> Op {
        Op::bgp(vec![TriplePattern {
            subject: Variable::new_unchecked(subject).into(),
            predicate: NamedNode::new_unchecked("http://ex/p").into(),
            object: Variable::new_unchecked(object).into(),
        }])
    }

    fn less_than(variable: &str, value: i64) -> Expression {
        Expression::Less(
            Box::new(Expression::Variable(Variable::new_unchecked(variable))),
            Box::new(Expression::Literal(Literal::from(value))),
        )
    }

    #[test]
    fn plain_patterns_are_linear() {
        assert!(is_linear(&triple("s", "a"), &triple("s", "b")));
        assert!(is_linear(
            &triple("s", "a"),
            &Op::union(triple("s", "b"), triple("a", "c"))
        ));
    }

    #[test]
    fn filters_on_unbound_outer_variables_are_not_linear() {
        let right = Op::filter(vec![less_than("a", 5)], triple("s", "b"));
        assert!(!is_linear(&triple("s", "a"), &right));

        let right = Op::filter(vec![less_than("b", 5)], triple("s", "b"));
        assert!(is_linear(&triple("s", "a"), &right));
    }

    #[test]
    fn optional_outer_variables_are_not_linear() {
        let right = Op::LeftJoin {
            left: Box::new(triple("s", "b")),
            right: Box::new(triple("b", "a")),
            expression: None,
        };
        assert!(!is_linear(&triple("s", "a"), &right));
    }

    #[test]
    fn sub_selects_sharing_variables_are_not_linear() {
        let right = Op::Project {
            inner: Box::new(triple("s", "b")),
            variables: vec![Variable::new_unchecked("s")],
        };
        assert!(!is_linear(&triple("s", "a"), &right));
        assert!(is_linear(&triple("x", "a"), &right));
    }

    #[test]
    fn left_join_filters_see_merged_solutions() {
        let filter = less_than("a", 5);
        assert!(is_linear_left_join(
            &triple("s", "a"),
            &triple("s", "b"),
            Some(&filter)
        ));
        let filter = Expression::Exists(Box::new(parliament_model::GraphPattern::Bgp {
            patterns: Vec::new(),
        }));
        assert!(!is_linear_left_join(
            &triple("s", "a"),
            &triple("s", "b"),
            Some(&filter)
        ));
    }
}
