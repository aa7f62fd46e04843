use super::{Number, NumericInner};
use crate::query::{IndexPatternQuerier, RangeSource};
use crate::record::Record;
use parliament_common::error::IndexError;
use parliament_common::{BindingIter, QueryResult};
use parliament_model::{
    pattern_to_term, substitute_triple, Binding, NamedNode, NamedNodePattern, Term, TermPattern,
    TriplePattern,
};
use std::ops::Bound;
use std::sync::Arc;

/// Answers `?s <predicate> ?o` patterns from a [NumericIndex](super::NumericIndex).
///
/// Only patterns whose object is a variable or a literal of the indexed number type are claimed.
/// Objects are matched and bound with the literal of the indexed triple, so the answers are the
/// ones the graph gives for an exact index.
pub struct NumericPatternQuerier<N> {
    inner: Arc<NumericInner<N>>,
}

impl<N: Number> NumericPatternQuerier<N> {
    pub(crate) fn new(inner: Arc<NumericInner<N>>) -> Self {
        Self { inner }
    }

    fn claims(&self, triple: &TriplePattern) -> bool {
        let NamedNodePattern::NamedNode(predicate) = &triple.predicate else {
            return false;
        };
        if predicate != self.inner.predicate() {
            return false;
        }
        let subject_ok = matches!(
            triple.subject,
            TermPattern::Variable(_) | TermPattern::NamedNode(_)
        );
        let object_ok = match &triple.object {
            TermPattern::Variable(_) => true,
            TermPattern::Literal(literal) => N::from_literal(literal).is_some(),
            _ => false,
        };
        subject_ok && object_ok
    }

    fn estimate_triple(&self, triple: &TriplePattern, size: usize) -> QueryResult<usize> {
        if !matches!(triple.subject, TermPattern::Variable(_)) {
            return Ok(1);
        }
        if let TermPattern::Literal(literal) = &triple.object {
            return Ok(self.inner.with_literal(literal)?.len());
        }
        Ok(size)
    }

    /// Extends `binding` with the solutions of one triple.
    fn solve(&self, triple: &TriplePattern, binding: &Binding) -> QueryResult<Vec<Binding>> {
        let triple = substitute_triple(triple, binding);
        match (&triple.subject, &triple.object) {
            (TermPattern::Variable(subject), TermPattern::Variable(object)) => {
                if subject == object {
                    return Ok(Vec::new());
                }
                Ok(self
                    .inner
                    .records()?
                    .into_iter()
                    .map(|Record { key, value }| {
                        let mut solution = binding.clone();
                        solution.insert(subject.clone(), key);
                        solution.insert(object.clone(), value.literal.into());
                        solution
                    })
                    .collect())
            }
            (TermPattern::Variable(subject), TermPattern::Literal(literal)) => Ok(self
                .inner
                .with_literal(literal)?
                .into_iter()
                .map(|record| binding.extended(subject.clone(), record.key))
                .collect()),
            (subject, object) => {
                let Some(subject) = pattern_to_term(subject) else {
                    return Ok(Vec::new());
                };
                let Some(current) = self.inner.find(&subject)? else {
                    return Ok(Vec::new());
                };
                match object {
                    TermPattern::Variable(object) => Ok(vec![
                        binding.extended(object.clone(), current.literal.into())
                    ]),
                    TermPattern::Literal(literal) if current.literal == *literal => {
                        Ok(vec![binding.clone()])
                    }
                    _ => Ok(Vec::new()),
                }
            }
        }
    }
}

impl<N: Number> IndexPatternQuerier for NumericPatternQuerier<N> {
    fn examine(&self, pattern: &[TriplePattern]) -> Vec<TriplePattern> {
        pattern
            .iter()
            .filter(|triple| self.claims(triple))
            .cloned()
            .collect()
    }

    fn estimate(&self, pattern: &[TriplePattern]) -> i64 {
        let size = match self.inner.size() {
            Ok(size) => size,
            Err(error) => {
                tracing::warn!(error = %error, "Could not estimate numeric pattern");
                return -1;
            }
        };
        let mut estimate = size;
        for triple in pattern {
            match self.estimate_triple(triple, size) {
                Ok(count) => estimate = estimate.min(count),
                Err(error) => {
                    tracing::warn!(error = %error, "Could not estimate numeric pattern");
                    return -1;
                }
            }
        }
        i64::try_from(estimate).unwrap_or(i64::MAX)
    }

    fn query(&self, pattern: &[TriplePattern], binding: &Binding) -> QueryResult<BindingIter<'static>> {
        let mut solutions = vec![binding.clone()];
        for triple in pattern {
            let mut next = Vec::new();
            for solution in &solutions {
                next.extend(self.solve(triple, solution)?);
            }
            solutions = next;
            if solutions.is_empty() {
                break;
            }
        }
        Ok(Box::new(solutions.into_iter().map(Ok)))
    }
}

/// Answers range filters over the objects of the predicate of a
/// [NumericIndex](super::NumericIndex).
pub struct NumericRangeSource<N> {
    inner: Arc<NumericInner<N>>,
}

impl<N: Number> NumericRangeSource<N> {
    pub(crate) fn new(inner: Arc<NumericInner<N>>) -> Self {
        Self { inner }
    }
}

impl<N: Number> RangeSource for NumericRangeSource<N> {
    fn predicate(&self) -> &NamedNode {
        self.inner.predicate()
    }

    fn subjects_in_range(
        &self,
        lower: Bound<f64>,
        upper: Bound<f64>,
    ) -> Result<Box<dyn Iterator<Item = Term> + Send>, IndexError> {
        let records = self
            .inner
            .range(N::lower_bound(lower), N::upper_bound(upper))?;
        Ok(Box::new(records.into_iter().map(|record| record.key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::IndexHandle;
    use crate::index::Index;
    use crate::numeric::NumericIndex;
    use parliament_model::vocab::xsd;
    use parliament_model::{Literal, Triple, Variable};

    #[test]
    fn examine_claims_indexed_triples_only() {
        let (_, querier) = querier();
        let claimed = triple(var("s"), var("o"));
        let pattern = vec![
            claimed.clone(),
            triple(var("s"), Literal::from(2.5).into()),
            TriplePattern {
                subject: var("s"),
                predicate: NamedNode::new_unchecked("http://ex/name").into(),
                object: var("o"),
            },
        ];
        assert_eq!(querier.examine(&pattern), vec![claimed]);
    }

    #[test]
    fn query_handles_all_binding_cases() -> QueryResult<()> {
        let (index, querier) = querier();
        index.add(Record::new(iri("a"), 30.into()))?;
        index.add(Record::new(iri("b"), 40.into()))?;
        index.add(Record::new(iri("c"), 30.into()))?;

        let all = run(&querier, triple(var("s"), var("o")), &Binding::new())?;
        assert_eq!(all.len(), 3);

        let by_value = run(&querier, triple(var("s"), Literal::from(30).into()), &Binding::new())?;
        assert_eq!(by_value.len(), 2);

        let by_subject = run(&querier, triple(var("s"), var("o")), &bound("s", iri("b")))?;
        assert_eq!(
            by_subject[0].get(&Variable::new_unchecked("o")),
            Some(&Term::from(Literal::from(40_i64)))
        );

        let check = triple(TermPattern::NamedNode(iri("a")), Literal::from(30).into());
        assert_eq!(run(&querier, check.clone(), &Binding::new())?.len(), 1);
        let mismatch = triple(TermPattern::NamedNode(iri("b")), Literal::from(30).into());
        assert!(run(&querier, mismatch, &Binding::new())?.is_empty());
        let missing = triple(TermPattern::NamedNode(iri("z")), var("o"));
        assert!(run(&querier, missing, &Binding::new())?.is_empty());

        assert_eq!(querier.estimate(&[triple(var("s"), var("o"))]), 3);
        assert_eq!(querier.estimate(&[check]), 1);
        Ok(())
    }

    #[test]
    fn objects_are_matched_by_their_literal() -> QueryResult<()> {
        let (index, querier) = querier();
        let padded = Literal::new_typed_literal("041", xsd::INTEGER);
        index.triple_added(&Triple::new(iri("dave"), predicate(), padded.clone()))?;
        index.triple_added(&Triple::new(iri("erin"), predicate(), Literal::from(41)))?;

        let solutions = run(&querier, triple(TermPattern::NamedNode(iri("dave")), var("o")), &Binding::new())?;
        assert_eq!(
            solutions[0].get(&Variable::new_unchecked("o")),
            Some(&Term::from(padded.clone()))
        );

        let by_padded = run(&querier, triple(var("s"), padded.clone().into()), &Binding::new())?;
        assert_eq!(by_padded, vec![bound("s", iri("dave"))]);
        let by_canonical = run(&querier, triple(var("s"), Literal::from(41).into()), &Binding::new())?;
        assert_eq!(by_canonical, vec![bound("s", iri("erin"))]);

        let check = triple(TermPattern::NamedNode(iri("dave")), Literal::from(41).into());
        assert!(run(&querier, check, &Binding::new())?.is_empty());
        assert_eq!(querier.estimate(&[triple(var("s"), padded.into())]), 1);
        Ok(())
    }

    #[test]
    fn range_source_returns_a_superset() -> QueryResult<()> {
        let (index, _) = querier();
        for (name, value) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            index.add(Record::new(iri(name), value.into()))?;
        }
        let source = Index::range_source(&index).unwrap();
        let subjects: Vec<_> = source
            .subjects_in_range(Bound::Excluded(1.5), Bound::Excluded(3.0))?
            .collect();
        assert_eq!(subjects, vec![iri("a").into(), iri("b").into(), iri("c").into()]);

        let empty: Vec<_> = source
            .subjects_in_range(Bound::Included(5.0), Bound::Included(4.5))?
            .collect();
        assert!(empty.is_empty());
        Ok(())
    }

    fn querier() -> (NumericIndex<i64>, NumericPatternQuerier<i64>) {
        let index = NumericIndex::new(predicate());
        Index::open(&index).unwrap();
        let querier = NumericPatternQuerier::new(Arc::clone(&index.inner));
        (index, querier)
    }

    fn run(
        querier: &NumericPatternQuerier<i64>,
        triple: TriplePattern,
        binding: &Binding,
    ) -> QueryResult<Vec<Binding>> {
        querier.query(&[triple], binding)?.collect()
    }

    fn triple(subject: TermPattern, object: TermPattern) -> TriplePattern {
        TriplePattern {
            subject,
            predicate: predicate().into(),
            object,
        }
    }

    fn bound(name: &str, node: NamedNode) -> Binding {
        Binding::new().extended(Variable::new_unchecked(name), node.into())
    }

    fn var(name: &str) -> TermPattern {
        Variable::new_unchecked(name).into()
    }

    fn iri(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://ex/{name}"))
    }

    fn predicate() -> NamedNode {
        NamedNode::new_unchecked("http://ex/age")
    }
}
