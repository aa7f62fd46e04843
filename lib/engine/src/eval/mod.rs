//! The pull-based evaluation of [Op] trees.
//!
//! Every operator is evaluated for one incoming solution and returns a lazy iterator over the
//! solutions that extend it. Sequences and linear joins feed each solution of one side into the
//! other side, so variables bound early restrict the triple lookups done later.

mod bgp;
mod functions;
mod iter;
mod join;
mod modifiers;
mod path;

use crate::context::{ExecutionContext, NamedGraphSource};
use crate::expression::{ExistsEvaluator, ExpressionEvaluator};
use iter::{Cancellable, FlatMapOk};
use parliament_common::{BindingIter, QueryResult, TripleSource};
use parliament_index::IndexSet;
use parliament_logical::Op;
use parliament_model::{Binding, Expression, GraphPattern, NamedNodePattern, Term};
use std::iter::once;

/// Evaluates operators against the graphs of an [ExecutionContext].
#[derive(Clone, Copy)]
pub struct Executor<'a> {
    context: &'a ExecutionContext<'a>,
    source: &'a dyn TripleSource,
    indexes: &'a IndexSet,
}

impl<'a> Executor<'a> {
    /// Creates an executor that evaluates against the default graph of `context`.
    pub fn new(context: &'a ExecutionContext<'a>) -> Self {
        Self {
            context,
            source: context.source(),
            indexes: context.indexes(),
        }
    }

    pub fn context(&self) -> &'a ExecutionContext<'a> {
        self.context
    }

    /// Returns the solutions of `op`.
    pub fn execute<'o>(&self, op: &'o Op) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        self.eval(op, Binding::new())
    }

    /// Returns the solutions of `op` that extend `input`.
    pub fn eval<'o>(&self, op: &'o Op, input: Binding) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let cancellation = self.context.cancellation();
        cancellation.check()?;
        let solutions = match op {
            Op::Bgp(pattern) => self.solve(pattern, &[], input)?,
            Op::Path {
                subject,
                path,
                object,
            } => self.eval_path(subject, path, object, input)?,
            Op::Table { rows, .. } => Box::new(
                rows.iter()
                    .filter_map(move |row| row.merge(&input))
                    .map(Ok)
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            Op::Join { left, right } => self.eval_join(left, right, input)?,
            Op::Sequence(elements) => self.eval_sequence(elements, input),
            Op::LeftJoin {
                left,
                right,
                expression,
            } => self.eval_left_join(left, right, expression.as_ref(), input)?,
            Op::Conditional { left, right } => self.eval_conditional(left, right, None, input)?,
            Op::Filter { expressions, inner } => {
                let expressions: Vec<&'o Expression> = expressions.iter().collect();
                match inner.as_ref() {
                    Op::Bgp(pattern) => self.solve(pattern, &expressions, input)?,
                    inner => self.filter(self.eval(inner, input)?, expressions),
                }
            }
            Op::Union { left, right } => {
                let left = self.eval(left, input.clone())?;
                let right = self.eval(right, input)?;
                Box::new(left.chain(right))
            }
            Op::Minus { left, right } => self.eval_minus(left, right, input)?,
            Op::Graph { name, inner } => self.eval_graph(name, inner, input)?,
            Op::Extend {
                inner,
                variable,
                expression,
            } => self.eval_extend(inner, variable, expression, input)?,
            Op::PropFunc {
                uri,
                subject,
                object,
                pattern,
                inner,
            } => self.eval_property_function(uri, subject, object, pattern, inner, input)?,
            Op::IndexPropFunc {
                uri,
                subject,
                object,
                pattern,
                inner,
            } => self.eval_index_property_function(uri, subject, object, pattern, inner, input)?,
            Op::OrderBy { inner, expressions } => self.eval_order_by(inner, expressions, input)?,
            Op::Project { inner, variables } => self.eval_project(inner, variables, input)?,
            Op::Distinct { inner } => self.eval_distinct(inner, input)?,
            Op::Reduced { inner } => self.eval_reduced(inner, input)?,
            Op::Slice {
                inner,
                start,
                length,
            } => self.eval_slice(inner, *start, *length, input)?,
        };
        Ok(Box::new(Cancellable::new(solutions, cancellation.clone())))
    }

    fn eval_sequence<'o>(&self, elements: &'o [Op], input: Binding) -> BindingIter<'o>
    where
        'a: 'o,
    {
        let mut solutions: BindingIter<'o> = Box::new(once(Ok(input)));
        for element in elements {
            let executor = *self;
            solutions = Box::new(FlatMapOk::new(solutions, move |binding| {
                executor.eval(element, binding)
            }));
        }
        solutions
    }

    fn eval_graph<'o>(
        &self,
        name: &'o NamedNodePattern,
        inner: &'o Op,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let graph_name = match name {
            NamedNodePattern::NamedNode(node) => Some(node),
            NamedNodePattern::Variable(variable) => match input.get(variable) {
                Some(Term::NamedNode(node)) => Some(node),
                Some(_) => return Ok(Box::new(std::iter::empty())),
                None => None,
            },
        };
        if let Some(graph_name) = graph_name {
            return match self.context.named_graph(graph_name) {
                Some(graph) => self.with_graph(graph).eval(inner, input),
                None => Ok(Box::new(std::iter::empty())),
            };
        }

        let NamedNodePattern::Variable(variable) = name else {
            return Ok(Box::new(std::iter::empty()));
        };
        let solutions = self
            .context
            .named_graphs()
            .iter()
            .map(|graph| {
                let input = input.extended(variable.clone(), graph.name.clone().into());
                self.with_graph(graph).eval(inner, input)
            })
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(Box::new(solutions.into_iter().flatten()))
    }

    fn with_graph(&self, graph: &'a NamedGraphSource<'a>) -> Self {
        Self {
            context: self.context,
            source: graph.source,
            indexes: &graph.indexes,
        }
    }

    /// Keeps the solutions that pass all `expressions`.
    fn filter<'o>(
        &self,
        solutions: BindingIter<'o>,
        expressions: Vec<&'o Expression>,
    ) -> BindingIter<'o>
    where
        'a: 'o,
    {
        if expressions.is_empty() {
            return solutions;
        }
        let executor = *self;
        Box::new(solutions.filter_map(move |solution| match solution {
            Ok(binding) => match executor.passes(&expressions, &binding) {
                Ok(true) => Some(Ok(binding)),
                Ok(false) => None,
                Err(error) => Some(Err(error)),
            },
            Err(error) => Some(Err(error)),
        }))
    }

    fn passes(&self, expressions: &[&Expression], binding: &Binding) -> QueryResult<bool> {
        let evaluator = ExpressionEvaluator::new(self);
        for expression in expressions {
            if !evaluator.test(expression, binding)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl ExistsEvaluator for Executor<'_> {
    fn exists(&self, pattern: &GraphPattern, binding: &Binding) -> QueryResult<bool> {
        let op = Op::from_graph_pattern(pattern)?;
        let mut solutions = self.eval(&op, binding.clone())?;
        let found = solutions.next().transpose()?.is_some();
        Ok(found)
    }
}

/// Returns the solutions of `op` against the graphs of `context`.
pub fn execute<'o>(op: &'o Op, context: &'o ExecutionContext<'o>) -> QueryResult<BindingIter<'o>> {
    Executor::new(context).execute(op)
}
