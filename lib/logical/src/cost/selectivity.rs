use parliament_common::{TripleMatch, TripleSource};
use parliament_model::{triple_variables, BasicPattern, TriplePattern, Variable};

/// How the estimate of a candidate triple is combined with the estimate of the triples that were
/// already ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderingHeuristic {
    /// A triple sharing a bound variable costs its own count, any other triple multiplies the
    /// current estimate.
    #[default]
    Static,
    /// Distinguishes triples whose variables are all bound, triples that only add variables and
    /// triples that are disconnected from the bound variables.
    Updated,
}

/// A basic graph pattern in evaluation order together with the estimated number of solutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedPattern {
    pub pattern: BasicPattern,
    /// The estimate after the last triple. [i64::MAX] if nothing is known.
    pub estimate: i64,
}

/// The number of triples that match the constants of `pattern`.
///
/// The count of every constant position is looked up and the smallest one is used. Positions the
/// source can not count are ignored. Returns [i64::MAX] if no position could be counted.
pub fn triple_count(pattern: &TriplePattern, source: &dyn TripleSource) -> i64 {
    TripleMatch::from_pattern(pattern)
        .constants()
        .iter()
        .map(|(term, position)| source.count_in_position(term, *position))
        .filter(|count| *count >= 0)
        .min()
        .unwrap_or(i64::MAX)
}

/// Orders `pattern` so that the most selective triple is evaluated first.
///
/// `bound` contains the variables that are already bound when the pattern is evaluated. The
/// ordering is deterministic: if two triples have the same estimate, the one that appears first in
/// `pattern` wins. If the source knows nothing about the pattern, the order is left unchanged.
pub fn order_by_selectivity(
    pattern: &[TriplePattern],
    source: &dyn TripleSource,
    bound: &[Variable],
    heuristic: OrderingHeuristic,
) -> OrderedPattern {
    order(pattern, source, bound, heuristic, pattern.len())
}

/// Estimates the number of solutions of `pattern` from its four most selective triples.
pub fn estimate_selectivity(pattern: &[TriplePattern], source: &dyn TripleSource) -> i64 {
    order(pattern, source, &[], OrderingHeuristic::Static, 4).estimate
}

fn order(
    pattern: &[TriplePattern],
    source: &dyn TripleSource,
    bound: &[Variable],
    heuristic: OrderingHeuristic,
    max_triples: usize,
) -> OrderedPattern {
    let mut remaining: Vec<(&TriplePattern, i64)> = pattern
        .iter()
        .map(|triple| (triple, triple_count(triple, source)))
        .collect();
    let mut bound = bound.to_vec();
    let mut ordered = Vec::with_capacity(pattern.len());
    let mut current = 1;
    let mut estimate = if pattern.is_empty() { 1 } else { i64::MAX };

    while !remaining.is_empty() && ordered.len() < max_triples {
        let mut best: Option<(usize, i64)> = None;
        for (idx, (triple, count)) in remaining.iter().enumerate() {
            let variables: Vec<&Variable> = triple_variables(triple).collect();
            let candidate = match heuristic {
                OrderingHeuristic::Static => static_estimate(current, *count, &bound, &variables),
                OrderingHeuristic::Updated => updated_estimate(current, *count, &bound, &variables),
            };
            if best.map_or(true, |(_, best)| candidate < best) {
                best = Some((idx, candidate));
            }
        }
        let Some((idx, candidate)) = best else {
            break;
        };
        let (triple, _) = remaining.remove(idx);
        for variable in triple_variables(triple) {
            if !bound.contains(variable) {
                bound.push(variable.clone());
            }
        }
        ordered.push(triple.clone());
        estimate = candidate;
        current = if candidate > 0 { candidate } else { 1 };
    }

    ordered.extend(remaining.into_iter().map(|(triple, _)| triple.clone()));
    OrderedPattern {
        pattern: ordered,
        estimate,
    }
}

fn static_estimate(current: i64, count: i64, bound: &[Variable], variables: &[&Variable]) -> i64 {
    if variables.iter().any(|variable| bound.contains(variable)) {
        count
    } else {
        count.saturating_mul(current)
    }
}

fn updated_estimate(current: i64, count: i64, bound: &[Variable], variables: &[&Variable]) -> i64 {
    if bound.is_empty() {
        return count;
    }
    let new_subset_of_old = variables.iter().all(|variable| bound.contains(variable));
    let shares = variables.iter().any(|variable| bound.contains(variable));
    let old_subset_of_new = bound.iter().all(|variable| variables.contains(&variable));
    if new_subset_of_old && bound.len() == 1 {
        current.min(count)
    } else if new_subset_of_old {
        current
    } else if shares && old_subset_of_new {
        current.max(count)
    } else if shares {
        match count.saturating_mul(current) {
            i64::MAX => i64::MAX,
            product => product / 2,
        }
    } else {
        count.saturating_mul(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parliament_common::{GraphCapabilities, TriplePosition};
    use parliament_model::{NamedNode, Term, Triple};

    /// Answers counts from a fixed table instead of real triples.
    struct Counts(Vec<(&'static str, i64)>);

    impl TripleSource for Counts {
        fn find(&self, _pattern: &TripleMatch) -> Box<dyn Iterator<Item = Triple> + '_> {
            Box::new(std::iter::empty())
        }

        fn count_in_position(&self, node: &Term, _position: TriplePosition) -> i64 {
            self.0
                .iter()
                .find(|(iri, _)| *node == Term::from(NamedNode::new_unchecked(*iri)))
                .map_or(-1, |(_, count)| *count)
        }

        fn len(&self) -> usize {
            0
        }

        fn capabilities(&self) -> GraphCapabilities {
            GraphCapabilities::default()
        }
    }

    fn triple(subject: &str, predicate: &str, object: &str) -> TriplePattern {
        TriplePattern {
            subject: Variable::new_unchecked(subject).into(),
            predicate: NamedNode::new_unchecked(predicate).into(),
            object: Variable::new_unchecked(object).into(),
        }
    }

    fn source() -> Counts {
        Counts(vec![
            ("http://ex/name", 1000),
            ("http://ex/ssn", 10),
            ("http://ex/knows", 500),
        ])
    }

    #[test]
    fn most_selective_triple_comes_first() {
        let pattern = vec![
            triple("p", "http://ex/name", "n"),
            triple("p", "http://ex/knows", "q"),
            triple("p", "http://ex/ssn", "s"),
        ];
        let ordered = order_by_selectivity(&pattern, &source(), &[], OrderingHeuristic::Static);
        assert_eq!(
            ordered.pattern,
            vec![pattern[2].clone(), pattern[1].clone(), pattern[0].clone()]
        );
        assert_eq!(ordered.estimate, 1000);
    }

    #[test]
    fn ordering_is_deterministic_for_ties() {
        let pattern = vec![
            triple("a", "http://ex/knows", "b"),
            triple("b", "http://ex/knows", "c"),
            triple("c", "http://ex/knows", "d"),
        ];
        for heuristic in [OrderingHeuristic::Static, OrderingHeuristic::Updated] {
            let first = order_by_selectivity(&pattern, &source(), &[], heuristic);
            let second = order_by_selectivity(&pattern, &source(), &[], heuristic);
            assert_eq!(first, second);
            assert_eq!(first.pattern, pattern);
        }
    }

    #[test]
    fn unknown_counts_keep_the_order() {
        let pattern = vec![
            triple("a", "http://ex/unknown", "b"),
            triple("b", "http://ex/other", "c"),
        ];
        let ordered = order_by_selectivity(&pattern, &source(), &[], OrderingHeuristic::Static);
        assert_eq!(ordered.pattern, pattern);
        assert_eq!(ordered.estimate, i64::MAX);
    }

    #[test]
    fn disconnected_triples_multiply() {
        let pattern = vec![
            triple("a", "http://ex/ssn", "b"),
            triple("c", "http://ex/ssn", "d"),
        ];
        assert_eq!(estimate_selectivity(&pattern, &source()), 100);
    }

    #[test]
    fn updated_heuristic_halves_connected_triples() {
        let pattern = vec![
            triple("a", "http://ex/ssn", "b"),
            triple("b", "http://ex/knows", "c"),
        ];
        let ordered = order_by_selectivity(&pattern, &source(), &[], OrderingHeuristic::Updated);
        assert_eq!(ordered.pattern, pattern);
        assert_eq!(ordered.estimate, 2500);
    }
}
