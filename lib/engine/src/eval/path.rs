use super::Executor;
use itertools::Itertools;
use parliament_common::{BindingIter, QueryResult, TripleMatch};
use parliament_model::{
    pattern_to_term, substitute_term, Binding, PropertyPathExpression, Term, TermPattern,
};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// The direction in which a path is followed.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl<'a> Executor<'a> {
    /// Evaluates a property path between two terms.
    ///
    /// Sequences and alternatives keep duplicates, while the repetition operators return every
    /// pair of connected nodes once.
    pub(super) fn eval_path<'o>(
        &self,
        subject: &'o TermPattern,
        path: &'o PropertyPathExpression,
        object: &'o TermPattern,
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        let subject = substitute_term(subject, &input);
        let object = substitute_term(object, &input);
        let start = pattern_to_term(&subject);
        let end = pattern_to_term(&object);
        let pairs = self.path_pairs(path, start.as_ref(), end.as_ref())?;
        Ok(Box::new(pairs.into_iter().filter_map(move |(from, to)| {
            let binding = bind_end(&subject, from, input.clone())?;
            bind_end(&object, to, binding).map(Ok)
        })))
    }

    /// Returns the pairs of nodes connected by `path`, restricted to the given ends.
    fn path_pairs(
        &self,
        path: &PropertyPathExpression,
        start: Option<&Term>,
        end: Option<&Term>,
    ) -> QueryResult<Vec<(Term, Term)>> {
        self.context.cancellation().check()?;
        Ok(match path {
            PropertyPathExpression::NamedNode(predicate) => self
                .source
                .find(&TripleMatch::new(
                    start.cloned(),
                    Some(predicate.clone()),
                    end.cloned(),
                ))
                .map(|triple| (triple.subject.into(), triple.object))
                .collect(),
            PropertyPathExpression::Reverse(inner) => self
                .path_pairs(inner, end, start)?
                .into_iter()
                .map(|(from, to)| (to, from))
                .collect(),
            PropertyPathExpression::Sequence(first, second) => {
                let mut pairs = Vec::new();
                if start.is_none() && end.is_some() {
                    for (middle, to) in self.path_pairs(second, None, end)? {
                        for (from, _) in self.path_pairs(first, None, Some(&middle))? {
                            pairs.push((from, to.clone()));
                        }
                    }
                } else {
                    for (from, middle) in self.path_pairs(first, start, None)? {
                        for (_, to) in self.path_pairs(second, Some(&middle), end)? {
                            pairs.push((from.clone(), to));
                        }
                    }
                }
                pairs
            }
            PropertyPathExpression::Alternative(first, second) => {
                let mut pairs = self.path_pairs(first, start, end)?;
                pairs.extend(self.path_pairs(second, start, end)?);
                pairs
            }
            PropertyPathExpression::ZeroOrMore(inner) => {
                self.closure_pairs(inner, start, end, true)?
            }
            PropertyPathExpression::OneOrMore(inner) => {
                self.closure_pairs(inner, start, end, false)?
            }
            PropertyPathExpression::ZeroOrOne(inner) => {
                let mut pairs = self.zero_length_pairs(start, end)?;
                pairs.extend(self.path_pairs(inner, start, end)?);
                pairs.into_iter().unique().collect()
            }
            PropertyPathExpression::NegatedPropertySet(excluded) => self
                .source
                .find(&TripleMatch::new(start.cloned(), None, end.cloned()))
                .filter(|triple| !excluded.contains(&triple.predicate))
                .map(|triple| (triple.subject.into(), triple.object))
                .collect(),
        })
    }

    /// The pairs connected by any number of repetitions of `path`.
    fn closure_pairs(
        &self,
        path: &PropertyPathExpression,
        start: Option<&Term>,
        end: Option<&Term>,
        zero_length: bool,
    ) -> QueryResult<Vec<(Term, Term)>> {
        let mut pairs = Vec::new();
        match (start, end) {
            (Some(start), _) => {
                for node in self.reachable(path, start, Direction::Forward, zero_length)? {
                    if end.map_or(true, |end| *end == node) {
                        pairs.push((start.clone(), node));
                    }
                }
            }
            (None, Some(end)) => {
                for node in self.reachable(path, end, Direction::Backward, zero_length)? {
                    pairs.push((node, end.clone()));
                }
            }
            (None, None) => {
                for start in self.all_nodes() {
                    for node in self.reachable(path, &start, Direction::Forward, zero_length)? {
                        pairs.push((start.clone(), node));
                    }
                }
            }
        }
        Ok(pairs)
    }

    fn zero_length_pairs(
        &self,
        start: Option<&Term>,
        end: Option<&Term>,
    ) -> QueryResult<Vec<(Term, Term)>> {
        Ok(match (start, end) {
            (Some(start), Some(end)) if start == end => vec![(start.clone(), end.clone())],
            (Some(_), Some(_)) => Vec::new(),
            (Some(node), None) | (None, Some(node)) => vec![(node.clone(), node.clone())],
            (None, None) => self
                .all_nodes()
                .into_iter()
                .map(|node| (node.clone(), node))
                .collect(),
        })
    }

    /// The nodes reachable from `origin` by following `path` in `direction` one or more times.
    /// `origin` is included if `zero_length` is set.
    fn reachable(
        &self,
        path: &PropertyPathExpression,
        origin: &Term,
        direction: Direction,
        zero_length: bool,
    ) -> QueryResult<Vec<Term>> {
        let mut visited = FxHashSet::default();
        let mut result = Vec::new();
        if zero_length {
            visited.insert(origin.clone());
            result.push(origin.clone());
        }
        let mut queue = VecDeque::from([origin.clone()]);
        while let Some(node) = queue.pop_front() {
            let next: Vec<Term> = match direction {
                Direction::Forward => self
                    .path_pairs(path, Some(&node), None)?
                    .into_iter()
                    .map(|(_, to)| to)
                    .collect(),
                Direction::Backward => self
                    .path_pairs(path, None, Some(&node))?
                    .into_iter()
                    .map(|(from, _)| from)
                    .collect(),
            };
            for next in next {
                if visited.insert(next.clone()) {
                    result.push(next.clone());
                    queue.push_back(next);
                }
            }
        }
        Ok(result)
    }

    /// Every subject and object of the graph, in order of first appearance.
    fn all_nodes(&self) -> Vec<Term> {
        self.source
            .find(&TripleMatch::default())
            .flat_map(|triple| [Term::from(triple.subject), triple.object])
            .unique()
            .collect()
    }
}

fn bind_end(pattern: &TermPattern, term: Term, binding: Binding) -> Option<Binding> {
    match pattern {
        TermPattern::Variable(variable) => match binding.get(variable) {
            Some(existing) => (*existing == term).then_some(binding),
            None => Some(binding.extended(variable.clone(), term)),
        },
        pattern => (pattern_to_term(pattern)? == term).then_some(binding),
    }
}
