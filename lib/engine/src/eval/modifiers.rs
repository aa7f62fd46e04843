use super::iter::materialize;
use super::Executor;
use crate::expression::{order_terms, ExpressionEvaluator};
use itertools::Itertools;
use parliament_common::{BindingIter, QueryResult};
use parliament_logical::Op;
use parliament_model::{Binding, Expression, OrderExpression, Term, Variable};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;

impl<'a> Executor<'a> {
    /// Binds `variable` to the value of `expression`.
    ///
    /// If the expression can not be evaluated, the solution is kept without the variable. If the
    /// variable is already bound, only solutions where both values agree are kept.
    pub(super) fn eval_extend<'o>(
        &self,
        inner: &'o Op,
        variable: &'o Variable,
        expression: &'o Expression,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let executor = *self;
        let solutions = self.eval(inner, input)?;
        Ok(Box::new(solutions.filter_map(move |solution| {
            let solution = match solution {
                Ok(solution) => solution,
                Err(error) => return Some(Err(error)),
            };
            let value = match ExpressionEvaluator::new(&executor).evaluate(expression, &solution) {
                Ok(Some(value)) => value,
                Ok(None) => return Some(Ok(solution)),
                Err(error) => return Some(Err(error)),
            };
            match solution.get(variable) {
                Some(existing) if *existing == value => Some(Ok(solution)),
                Some(_) => None,
                None => Some(Ok(solution.extended(variable.clone(), value))),
            }
        })))
    }

    pub(super) fn eval_order_by<'o>(
        &self,
        inner: &'o Op,
        expressions: &'o [OrderExpression],
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let solutions = materialize(self.eval(inner, input)?)?;
        let evaluator = ExpressionEvaluator::new(self);
        let keyed = solutions
            .into_iter()
            .map(|solution| {
                let keys = expressions
                    .iter()
                    .map(|expression| {
                        let (OrderExpression::Asc(expression) | OrderExpression::Desc(expression)) =
                            expression;
                        evaluator.evaluate(expression, &solution)
                    })
                    .collect::<QueryResult<Vec<Option<Term>>>>()?;
                Ok((keys, solution))
            })
            .collect::<QueryResult<Vec<_>>>()?;
        let sorted = keyed
            .into_iter()
            .sorted_by(|(lhs, _), (rhs, _)| compare_keys(expressions, lhs, rhs))
            .map(|(_, solution)| Ok(solution));
        Ok(Box::new(sorted))
    }

    /// Restricts solutions to `variables`. Variables bound by `input` are kept.
    pub(super) fn eval_project<'o>(
        &self,
        inner: &'o Op,
        variables: &'o [Variable],
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let solutions = self.eval(inner, input.clone())?;
        Ok(Box::new(solutions.map(move |solution| {
            let mut projected = solution?.project(variables);
            for (variable, term) in input.iter() {
                projected.insert(variable.clone(), term.clone());
            }
            Ok(projected)
        })))
    }

    pub(super) fn eval_distinct<'o>(
        &self,
        inner: &'o Op,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let mut seen = FxHashSet::default();
        let solutions = self.eval(inner, input)?;
        Ok(Box::new(solutions.filter(move |solution| match solution {
            Ok(solution) => seen.insert(solution.clone()),
            Err(_) => true,
        })))
    }

    /// Drops solutions that are equal to the previous solution.
    pub(super) fn eval_reduced<'o>(
        &self,
        inner: &'o Op,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let mut previous: Option<Binding> = None;
        let solutions = self.eval(inner, input)?;
        Ok(Box::new(solutions.filter(move |solution| match solution {
            Ok(solution) => {
                let duplicate = previous.as_ref() == Some(solution);
                previous = Some(solution.clone());
                !duplicate
            }
            Err(_) => true,
        })))
    }

    pub(super) fn eval_slice<'o>(
        &self,
        inner: &'o Op,
        start: usize,
        length: Option<usize>,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let solutions = self.eval(inner, input)?.skip(start);
        Ok(match length {
            Some(length) => Box::new(solutions.take(length)),
            None => Box::new(solutions),
        })
    }
}

fn compare_keys(
    expressions: &[OrderExpression],
    lhs: &[Option<Term>],
    rhs: &[Option<Term>],
) -> Ordering {
    for ((expression, lhs), rhs) in expressions.iter().zip(lhs).zip(rhs) {
        let ordering = order_terms(lhs.as_ref(), rhs.as_ref());
        let ordering = match expression {
            OrderExpression::Asc(_) => ordering,
            OrderExpression::Desc(_) => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
