use super::iter::{materialize, FlatMapOk};
use super::Executor;
use crate::expression::ExpressionEvaluator;
use parliament_common::{BindingIter, QueryResult};
use parliament_logical::join::{is_linear, is_linear_left_join};
use parliament_logical::Op;
use parliament_model::{Binding, Expression};
use std::iter::once;

impl<'a> Executor<'a> {
    /// Joins two operators.
    ///
    /// A linear join streams every solution of the left side into the right side. Otherwise, both
    /// sides are evaluated on their own and joined in memory, and the result is restricted to the
    /// solutions compatible with `input`.
    pub(super) fn eval_join<'o>(
        &self,
        left: &'o Op,
        right: &'o Op,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        if is_linear(left, right) {
            let executor = *self;
            let left = self.eval(left, input)?;
            return Ok(Box::new(FlatMapOk::new(left, move |binding| {
                executor.eval(right, binding)
            })));
        }

        tracing::trace!("Evaluating a join that can not be streamed");
        let right = materialize(self.eval(right, Binding::new())?)?;
        let left = self.eval(left, Binding::new())?;
        Ok(Box::new(left.flat_map(move |solution| {
            let joined: Vec<QueryResult<Binding>> = match solution {
                Ok(solution) => right
                    .iter()
                    .filter_map(|other| solution.merge(other))
                    .filter_map(|joined| joined.merge(&input))
                    .map(Ok)
                    .collect(),
                Err(error) => vec![Err(error)],
            };
            joined
        })))
    }

    /// An optional join with an optional filter that decides which right solutions match.
    pub(super) fn eval_left_join<'o>(
        &self,
        left: &'o Op,
        right: &'o Op,
        expression: Option<&'o Expression>,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        if is_linear_left_join(left, right, expression) {
            return self.eval_conditional(left, right, expression, input);
        }

        tracing::trace!("Evaluating an optional join that can not be streamed");
        let right = materialize(self.eval(right, Binding::new())?)?;
        let left = self.eval(left, Binding::new())?;
        let executor = *self;
        Ok(Box::new(left.flat_map(move |solution| {
            let solution = match solution {
                Ok(solution) => solution,
                Err(error) => return vec![Err(error)],
            };
            let mut joined = Vec::new();
            for other in &right {
                let Some(candidate) = solution.merge(other) else {
                    continue;
                };
                match executor.accepts(expression, &candidate) {
                    Ok(true) => joined.push(candidate),
                    Ok(false) => {}
                    Err(error) => return vec![Err(error)],
                }
            }
            if joined.is_empty() {
                joined.push(solution);
            }
            joined
                .into_iter()
                .filter_map(|joined| joined.merge(&input))
                .map(Ok)
                .collect()
        })))
    }

    /// Evaluates `right` once per solution of `left`. A left solution without a matching right
    /// solution is kept as is.
    pub(super) fn eval_conditional<'o>(
        &self,
        left: &'o Op,
        right: &'o Op,
        expression: Option<&'o Expression>,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let executor = *self;
        let left = self.eval(left, input)?;
        Ok(Box::new(FlatMapOk::new(left, move |solution| {
            let mut matches = Vec::new();
            for candidate in executor.eval(right, solution.clone())? {
                let candidate = candidate?;
                if executor.accepts(expression, &candidate)? {
                    matches.push(Ok(candidate));
                }
            }
            let solutions: BindingIter<'o> = if matches.is_empty() {
                Box::new(once(Ok(solution)))
            } else {
                Box::new(matches.into_iter())
            };
            Ok(solutions)
        })))
    }

    /// Removes the left solutions that are compatible with a right solution sharing a variable.
    pub(super) fn eval_minus<'o>(
        &self,
        left: &'o Op,
        right: &'o Op,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let right = materialize(self.eval(right, Binding::new())?)?;
        let left = self.eval(left, input)?;
        Ok(Box::new(left.filter(move |solution| {
            let Ok(solution) = solution else {
                return true;
            };
            !right.iter().any(|other| {
                other.variables().any(|variable| solution.contains(variable))
                    && solution.is_compatible(other)
            })
        })))
    }

    fn accepts(&self, expression: Option<&Expression>, binding: &Binding) -> QueryResult<bool> {
        match expression {
            Some(expression) => ExpressionEvaluator::new(self).test(expression, binding),
            None => Ok(true),
        }
    }
}
