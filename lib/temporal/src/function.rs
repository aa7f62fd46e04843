use crate::extent::TemporalExtent;
use crate::index::TemporalInner;
use crate::operand::{resolve, Operand};
use crate::relation::TemporalRelation;
use parliament_common::error::{IndexStateError, QueryEvaluationError};
use parliament_common::{BindingIter, CancellationFlag, IndexResult, QueryResult};
use parliament_index::{IndexPropertyFunction, PreparedCall, RecordIter, RelationalBinding};
use parliament_model::vocab::pt;
use parliament_model::{Binding, NamedNode, Term, TermPattern, TriplePattern, Variable};
use std::fmt;
use std::sync::Arc;

/// The property function `?x pt:<relation> ?y` answered by a temporal index.
pub struct TemporalPropertyFunction {
    relation: TemporalRelation,
    uri: NamedNode,
    operand_predicates: [NamedNode; 2],
    inner: Arc<TemporalInner>,
}

impl TemporalPropertyFunction {
    pub(crate) fn new(relation: TemporalRelation, inner: Arc<TemporalInner>) -> Self {
        Self {
            relation,
            uri: relation.uri(),
            operand_predicates: [pt::AS_INSTANT.into_owned(), pt::AS_INTERVAL.into_owned()],
            inner,
        }
    }

    pub fn relation(&self) -> TemporalRelation {
        self.relation
    }
}

impl fmt::Debug for TemporalPropertyFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporalPropertyFunction")
            .field("relation", &self.relation)
            .field("index", &self.inner.label())
            .finish_non_exhaustive()
    }
}

impl RelationalBinding for TemporalPropertyFunction {
    type Value = TemporalExtent;

    fn bind_first_var(&self, bound: &TemporalExtent) -> IndexResult<RecordIter<TemporalExtent>> {
        Ok(self.inner.bind_first_var(self.relation, bound, None)?)
    }

    fn bind_second_var(&self, bound: &TemporalExtent) -> IndexResult<RecordIter<TemporalExtent>> {
        Ok(self.inner.bind_second_var(self.relation, bound, None)?)
    }
}

impl IndexPropertyFunction for TemporalPropertyFunction {
    fn uri(&self) -> &NamedNode {
        &self.uri
    }

    fn index_label(&self) -> &str {
        self.inner.label()
    }

    fn operand_predicates(&self) -> &[NamedNode] {
        &self.operand_predicates
    }

    fn prepare(
        &self,
        subject: &TermPattern,
        object: &TermPattern,
        pattern: &[TriplePattern],
        cancellation: &CancellationFlag,
    ) -> QueryResult<Box<dyn PreparedCall>> {
        let (first, first_consumed) = resolve(subject, pattern, &self.inner)?;
        let (second, second_consumed) = resolve(object, pattern, &self.inner)?;
        let mut consumed: Vec<_> = first_consumed.into_iter().collect();
        if let Some(triple) = second_consumed {
            if !consumed.contains(&triple) {
                consumed.push(triple);
            }
        }
        Ok(Box::new(TemporalCall {
            relation: self.relation,
            inner: Arc::clone(&self.inner),
            first,
            second,
            consumed,
            cancellation: cancellation.clone(),
        }))
    }
}

/// A call of a [TemporalPropertyFunction] with resolved arguments.
struct TemporalCall {
    relation: TemporalRelation,
    inner: Arc<TemporalInner>,
    first: Operand,
    second: Operand,
    consumed: Vec<TriplePattern>,
    cancellation: CancellationFlag,
}

impl TemporalCall {
    fn count(&self) -> Result<i64, IndexStateError> {
        let drained = |records: RecordIter<TemporalExtent>| {
            i64::try_from(records.count()).unwrap_or(i64::MAX)
        };
        Ok(match (&self.first, &self.second) {
            (Operand::Missing, _) | (_, Operand::Missing) => 0,
            (Operand::Known(_), Operand::Known(_)) => 1,
            (Operand::Free(_), Operand::Known(y)) => drained(self.inner.bind_first_var(
                self.relation,
                y,
                Some(self.cancellation.clone()),
            )?),
            (Operand::Known(x), Operand::Free(_)) => drained(self.inner.bind_second_var(
                self.relation,
                x,
                Some(self.cancellation.clone()),
            )?),
            (Operand::Free(_), Operand::Free(_)) => {
                let size = i64::try_from(self.inner.size()?).unwrap_or(i64::MAX);
                size.saturating_mul(size)
            }
        })
    }
}

impl PreparedCall for TemporalCall {
    fn consumed(&self) -> &[TriplePattern] {
        &self.consumed
    }

    fn estimate(&self) -> i64 {
        match self.count() {
            Ok(count) => count,
            Err(error) => {
                tracing::warn!(
                    index = %self.inner.label(),
                    relation = %self.relation,
                    error = %error,
                    "Could not estimate temporal property function"
                );
                0
            }
        }
    }

    fn execute(&self, binding: &Binding) -> QueryResult<BindingIter<'static>> {
        let cancellation = Some(self.cancellation.clone());
        let solutions: BindingIter<'static> = match (&self.first, &self.second) {
            (Operand::Missing, _) | (_, Operand::Missing) => Box::new(std::iter::empty()),
            (Operand::Known(x), Operand::Known(y)) => {
                if self.relation.test(x, y) {
                    Box::new(std::iter::once(Ok(binding.clone())))
                } else {
                    Box::new(std::iter::empty())
                }
            }
            (Operand::Free(variable), Operand::Known(y)) => {
                let records = self.inner.bind_first_var(self.relation, y, cancellation)?;
                bind_all(records, binding.clone(), variable.clone())
            }
            (Operand::Known(x), Operand::Free(variable)) => {
                let records = self.inner.bind_second_var(self.relation, x, cancellation)?;
                bind_all(records, binding.clone(), variable.clone())
            }
            (Operand::Free(first), Operand::Free(second)) => {
                let inner = Arc::clone(&self.inner);
                let relation = self.relation;
                let binding = binding.clone();
                let (first, second) = (first.clone(), second.clone());
                Box::new(self.inner.records()?.into_iter().flat_map(
                    move |record| -> BindingIter<'static> {
                        let Some(partial) = bind(&binding, &first, record.key) else {
                            return Box::new(std::iter::empty());
                        };
                        match inner.bind_second_var(relation, &record.value, cancellation.clone()) {
                            Ok(records) => bind_all(records, partial, second.clone()),
                            Err(error) => {
                                Box::new(std::iter::once(Err(QueryEvaluationError::from(error))))
                            }
                        }
                    },
                ))
            }
        };
        let cancellation = self.cancellation.clone();
        Ok(Box::new(solutions.chain(
            std::iter::once_with(move || cancellation.check())
                .filter_map(Result::err)
                .map(Err),
        )))
    }
}

fn bind_all(
    records: RecordIter<TemporalExtent>,
    binding: Binding,
    variable: Variable,
) -> BindingIter<'static> {
    Box::new(records.filter_map(move |record| bind(&binding, &variable, record.key).map(Ok)))
}

/// Binds `variable` to `term`. Fails if `variable` is already bound to a different term.
pub(crate) fn bind(binding: &Binding, variable: &Variable, term: Term) -> Option<Binding> {
    match binding.get(variable) {
        Some(bound) => (*bound == term).then(|| binding.clone()),
        None => Some(binding.extended(variable.clone(), term)),
    }
}
