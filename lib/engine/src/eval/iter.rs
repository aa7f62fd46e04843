use parliament_common::error::QueryEvaluationError;
use parliament_common::{BindingIter, CancellationFlag, QueryResult};
use parliament_model::Binding;

/// Evaluates an operator once per solution of `input` and chains the results.
///
/// Errors of the input and of the operator are passed through.
pub(crate) struct FlatMapOk<'a, I, F> {
    input: I,
    f: F,
    current: Option<BindingIter<'a>>,
}

impl<'a, I, F> FlatMapOk<'a, I, F>
where
    I: Iterator<Item = QueryResult<Binding>>,
    F: FnMut(Binding) -> QueryResult<BindingIter<'a>>,
{
    pub fn new(input: I, f: F) -> Self {
        Self {
            input,
            f,
            current: None,
        }
    }
}

impl<'a, I, F> Iterator for FlatMapOk<'a, I, F>
where
    I: Iterator<Item = QueryResult<Binding>>,
    F: FnMut(Binding) -> QueryResult<BindingIter<'a>>,
{
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = &mut self.current {
                match current.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }
            match self.input.next()? {
                Ok(binding) => match (self.f)(binding) {
                    Ok(iter) => self.current = Some(iter),
                    Err(error) => return Some(Err(error)),
                },
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

/// Stops an iterator once its query has been cancelled.
///
/// The flag is polled before every element. After reporting
/// [QueryEvaluationError::Cancelled] once, the iterator is exhausted.
pub(crate) struct Cancellable<'a> {
    inner: BindingIter<'a>,
    cancellation: CancellationFlag,
    done: bool,
}

impl<'a> Cancellable<'a> {
    pub fn new(inner: BindingIter<'a>, cancellation: CancellationFlag) -> Self {
        Self {
            inner,
            cancellation,
            done: false,
        }
    }
}

impl Iterator for Cancellable<'_> {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cancellation.is_cancelled() {
            self.done = true;
            return Some(Err(QueryEvaluationError::Cancelled));
        }
        self.inner.next()
    }
}

/// Collects the solutions of `iter`, stopping at the first error.
pub(crate) fn materialize(iter: BindingIter<'_>) -> QueryResult<Vec<Binding>> {
    iter.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parliament_model::{Literal, Variable};

    fn solution(value: i64) -> Binding {
        Binding::new().extended(Variable::new_unchecked("x"), Literal::from(value).into())
    }

    #[test]
    fn flat_map_chains_results() -> QueryResult<()> {
        let input = vec![Ok(solution(1)), Ok(solution(2))].into_iter();
        let result = FlatMapOk::new(input, |binding| {
            let copy = binding.clone();
            let pair: BindingIter<'static> = Box::new(vec![Ok(binding), Ok(copy)].into_iter());
            Ok(pair)
        })
        .collect::<QueryResult<Vec<_>>>()?;
        assert_eq!(result, vec![solution(1), solution(1), solution(2), solution(2)]);
        Ok(())
    }

    #[test]
    fn cancelled_iterators_report_once() {
        let cancellation = CancellationFlag::new();
        let inner: BindingIter<'static> = Box::new(std::iter::repeat_with(|| Ok(solution(1))));
        let mut iter = Cancellable::new(inner, cancellation.clone());
        assert!(matches!(iter.next(), Some(Ok(_))));
        cancellation.cancel();
        assert!(matches!(iter.next(), Some(Err(QueryEvaluationError::Cancelled))));
        assert!(iter.next().is_none());
    }
}
