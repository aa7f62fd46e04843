use super::iter::FlatMapOk;
use super::Executor;
use parliament_common::{BindingIter, QueryResult};
use parliament_index::IndexPropertyFunction;
use parliament_logical::cost::estimate_selectivity;
use parliament_logical::Op;
use parliament_model::{
    substitute_pattern, substitute_term, Binding, NamedNode, TermPattern, TriplePattern,
};
use std::iter::once;
use std::sync::Arc;

impl<'a> Executor<'a> {
    /// Calls a generic property function once per solution of `inner`.
    ///
    /// A function that is not registered is evaluated as an ordinary triple pattern together with
    /// the triples describing its arguments.
    pub(super) fn eval_property_function<'o>(
        &self,
        uri: &'o NamedNode,
        subject: &'o TermPattern,
        object: &'o TermPattern,
        pattern: &'o [TriplePattern],
        inner: &'o Op,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let solutions = self.eval(inner, input)?;
        Ok(self.call_property_function(uri, subject, object, pattern, solutions))
    }

    fn call_property_function<'o>(
        &self,
        uri: &'o NamedNode,
        subject: &'o TermPattern,
        object: &'o TermPattern,
        pattern: &'o [TriplePattern],
        solutions: BindingIter<'o>,
    ) -> BindingIter<'o>
    where
        'a: 'o,
    {
        let executor = *self;
        let Some(function) = self.context.property_functions().get(uri).cloned() else {
            tracing::debug!(%uri, "Unknown property function, evaluating it as a triple pattern");
            let mut triples = pattern.to_vec();
            triples.push(TriplePattern {
                subject: subject.clone(),
                predicate: uri.clone().into(),
                object: object.clone(),
            });
            return Box::new(FlatMapOk::new(solutions, move |binding| {
                executor.solve(&triples, &[], binding)
            }));
        };
        Box::new(FlatMapOk::new(solutions, move |binding| {
            let pattern = substitute_pattern(pattern, &binding);
            let described = function.described(
                &substitute_term(subject, &binding),
                &substitute_term(object, &binding),
                &pattern,
            );
            let remaining: Vec<TriplePattern> = pattern
                .into_iter()
                .filter(|triple| !described.contains(triple))
                .collect();
            let function = Arc::clone(&function);
            let solutions = executor.solve(&remaining, &[], binding)?;
            let solutions: BindingIter<'o> = Box::new(FlatMapOk::new(solutions, move |binding| {
                let results = function.execute(
                    &substitute_term(subject, &binding),
                    &substitute_term(object, &binding),
                    &described,
                    &binding,
                    executor.source,
                )?;
                let results: BindingIter<'o> = Box::new(results.into_iter().map(Ok));
                Ok(results)
            }));
            Ok(solutions)
        }))
    }

    /// Calls a property function that is answered by an index.
    ///
    /// Without the index, the call is evaluated as its effective form. A basic graph pattern
    /// providing the input of the call is merged into the pattern of the call, so that the call can
    /// decide whether to run before or after these triples.
    pub(super) fn eval_index_property_function<'o>(
        &self,
        uri: &'o NamedNode,
        subject: &'o TermPattern,
        object: &'o TermPattern,
        pattern: &'o [TriplePattern],
        inner: &'o Op,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let Some(function) = self.indexes.property_function(uri).cloned() else {
            tracing::debug!(%uri, "No index for property function, using its effective form");
            return self.eval_property_function(uri, subject, object, pattern, inner, input);
        };

        let (solutions, pattern): (BindingIter<'o>, Vec<TriplePattern>) = match inner {
            Op::Bgp(inner) => (
                Box::new(once(Ok(input))),
                pattern.iter().chain(inner).cloned().collect(),
            ),
            inner => (self.eval(inner, input)?, pattern.to_vec()),
        };
        let executor = *self;
        Ok(Box::new(FlatMapOk::new(solutions, move |binding| {
            executor.index_call(&function, subject, object, &pattern, binding)
        })))
    }

    /// Evaluates a single call of an index backed function for `binding`.
    fn index_call<'o>(
        &self,
        function: &Arc<dyn IndexPropertyFunction>,
        subject: &TermPattern,
        object: &TermPattern,
        pattern: &[TriplePattern],
        binding: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let subject = substitute_term(subject, &binding);
        let object = substitute_term(object, &binding);
        let pattern = substitute_pattern(pattern, &binding);
        let call = function.prepare(&subject, &object, &pattern, self.context.cancellation())?;
        let remaining: Vec<TriplePattern> = pattern
            .into_iter()
            .filter(|triple| !call.consumed().contains(triple))
            .collect();

        let remaining_estimate = if remaining.is_empty() {
            1
        } else {
            estimate_selectivity(&remaining, self.source)
        };
        let call_estimate = call.estimate();
        let call_first =
            function.is_estimable() && call_estimate >= 0 && call_estimate <= remaining_estimate;
        tracing::trace!(
            uri = %function.uri(),
            call_estimate,
            remaining_estimate,
            call_first,
            "Placing index property function call"
        );

        let executor = *self;
        if call_first {
            let solutions: BindingIter<'o> = call.execute(&binding)?;
            Ok(Box::new(FlatMapOk::new(solutions, move |binding| {
                executor.solve(&remaining, &[], binding)
            })))
        } else {
            let solutions = executor.solve(&remaining, &[], binding)?;
            Ok(Box::new(FlatMapOk::new(solutions, move |binding| {
                let solutions: BindingIter<'o> = call.execute(&binding)?;
                Ok(solutions)
            })))
        }
    }
}
