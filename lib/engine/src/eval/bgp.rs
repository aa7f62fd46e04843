use super::iter::FlatMapOk;
use super::Executor;
use crate::expression::Numeric;
use parliament_common::{BindingIter, QueryResult, TripleMatch};
use parliament_index::{IndexPatternQuerier, RangeSource};
use parliament_logical::cost::{
    estimate_selectivity, order_by_selectivity, triple_count, OrderingHeuristic,
    TreewidthEstimator,
};
use parliament_logical::expression_variables;
use parliament_model::{
    bind_triple, pattern_variables, substitute_pattern, substitute_triple, triple_variables,
    Binding, Expression, NamedNodePattern, TermPattern, TriplePattern, Variable,
};
use std::iter::once;
use std::ops::Bound;
use std::sync::Arc;

/// A range over the objects of a numeric predicate that restricts a subject variable.
struct RangeRestriction {
    subject: Variable,
    source: Arc<dyn RangeSource>,
    lower: Bound<f64>,
    upper: Bound<f64>,
}

/// A part of a basic graph pattern that is evaluated as a unit.
enum Block {
    Index {
        querier: Arc<dyn IndexPatternQuerier>,
        pattern: Vec<TriplePattern>,
    },
    Graph(Vec<TriplePattern>),
}

impl Block {
    fn pattern(&self) -> &[TriplePattern] {
        match self {
            Self::Index { pattern, .. } | Self::Graph(pattern) => pattern,
        }
    }
}

impl<'a> Executor<'a> {
    /// Evaluates a basic graph pattern together with the filters directly above it.
    pub(super) fn solve<'o>(
        &self,
        pattern: &[TriplePattern],
        filters: &[&'o Expression],
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        if pattern.is_empty() {
            return Ok(self.filter(Box::new(once(Ok(input))), filters.to_vec()));
        }
        if let Some(restriction) = self.range_restriction(pattern, filters, &input) {
            return self.solve_range(restriction, pattern, filters, input);
        }
        if let Some(blocks) = self.index_plan(pattern) {
            return Ok(self.solve_blocks(blocks, filters, input));
        }
        Ok(self.solve_graph(pattern, filters, input))
    }

    /// Binds the subject of a range restricted triple to the candidates of the range index and
    /// solves the pattern for every candidate. The filters are re-applied afterward.
    fn solve_range<'o>(
        &self,
        restriction: RangeRestriction,
        pattern: &[TriplePattern],
        filters: &[&'o Expression],
        input: Binding,
    ) -> QueryResult<BindingIter<'o>>
    where
        'a: 'o,
    {
        tracing::debug!(
            predicate = %restriction.source.predicate(),
            lower = ?restriction.lower,
            upper = ?restriction.upper,
            "Answering range filter with an index"
        );
        let candidates = restriction
            .source
            .subjects_in_range(restriction.lower, restriction.upper)?;
        let subject = restriction.subject;
        let candidates =
            candidates.map(move |candidate| Ok(input.extended(subject.clone(), candidate)));
        let pattern = pattern.to_vec();
        let filters = filters.to_vec();
        let executor = *self;
        Ok(Box::new(FlatMapOk::new(candidates, move |binding| {
            executor.solve(&pattern, &filters, binding)
        })))
    }

    fn range_restriction(
        &self,
        pattern: &[TriplePattern],
        filters: &[&Expression],
        input: &Binding,
    ) -> Option<RangeRestriction> {
        if filters.is_empty() || self.indexes.range_sources().is_empty() {
            return None;
        }
        for triple in pattern {
            let (
                TermPattern::Variable(subject),
                NamedNodePattern::NamedNode(predicate),
                TermPattern::Variable(object),
            ) = (&triple.subject, &triple.predicate, &triple.object)
            else {
                continue;
            };
            if input.contains(subject) || input.contains(object) {
                continue;
            }
            let Some(source) = self.indexes.range_source_for(predicate) else {
                continue;
            };
            let mut lower = Bound::Unbounded;
            let mut upper = Bound::Unbounded;
            for filter in filters {
                match range_bound(filter, object) {
                    Some(RangeBound::Lower(bound)) => lower = tighter(lower, bound, true),
                    Some(RangeBound::Upper(bound)) => upper = tighter(upper, bound, false),
                    None => {}
                }
            }
            if lower == Bound::Unbounded && upper == Bound::Unbounded {
                continue;
            }
            return Some(RangeRestriction {
                subject: subject.clone(),
                source: Arc::clone(source),
                lower,
                upper,
            });
        }
        None
    }

    /// Splits the pattern into the parts claimed by index queriers and the connected components
    /// of the rest. Returns [None] if no querier claims a triple.
    fn index_plan(&self, pattern: &[TriplePattern]) -> Option<Vec<Block>> {
        let queriers = self.indexes.queriers();
        if queriers.is_empty() {
            return None;
        }

        let mut rest = pattern.to_vec();
        let mut blocks = Vec::new();
        for querier in queriers {
            let claimed = querier.examine(&rest);
            if claimed.is_empty() {
                continue;
            }
            rest.retain(|triple| !claimed.contains(triple));
            let estimate = querier.estimate(&claimed);
            blocks.push((
                Block::Index {
                    querier: Arc::clone(querier),
                    pattern: claimed,
                },
                estimate,
            ));
        }
        if blocks.is_empty() {
            return None;
        }
        for component in connected_components(&rest) {
            let estimate = estimate_selectivity(&component, self.source);
            blocks.push((Block::Graph(component), estimate));
        }
        Some(order_blocks(blocks))
    }

    fn solve_blocks<'o>(
        &self,
        blocks: Vec<Block>,
        filters: &[&'o Expression],
        input: Binding,
    ) -> BindingIter<'o>
    where
        'a: 'o,
    {
        let mut solutions: BindingIter<'o> = Box::new(once(Ok(input)));
        for block in blocks {
            let executor = *self;
            solutions = match block {
                Block::Index { querier, pattern } => {
                    Box::new(FlatMapOk::new(solutions, move |binding| {
                        let solutions: BindingIter<'o> = querier.query(&pattern, &binding)?;
                        Ok(solutions)
                    }))
                }
                Block::Graph(pattern) => Box::new(FlatMapOk::new(solutions, move |binding| {
                    Ok(executor.solve_graph(&pattern, &[], binding))
                })),
            };
        }
        self.filter(solutions, filters.to_vec())
    }

    /// Evaluates the pattern against the triple source with nested loops.
    ///
    /// Every filter is applied right after the triple that binds its last variable.
    pub(super) fn solve_graph<'o>(
        &self,
        pattern: &[TriplePattern],
        filters: &[&'o Expression],
        input: Binding,
    ) -> BindingIter<'o>
    where
        'a: 'o,
    {
        let ordered = self.order(pattern, &input);
        let stages = filter_stages(&ordered, filters, &input);

        let mut stages = stages.into_iter();
        let first = stages.next().unwrap_or_default();
        let mut solutions = self.filter(Box::new(once(Ok(input))), first);
        for (triple, filters) in ordered.into_iter().zip(stages) {
            let executor = *self;
            solutions = Box::new(FlatMapOk::new(solutions, move |binding| {
                Ok(executor.match_triple(&triple, binding))
            }));
            solutions = self.filter(solutions, filters);
        }
        solutions
    }

    /// Returns the solutions of a single triple pattern that extend `binding`.
    pub(super) fn match_triple<'o>(&self, triple: &TriplePattern, binding: Binding) -> BindingIter<'o>
    where
        'a: 'o,
    {
        let concrete = substitute_triple(triple, &binding);
        let matches = self.source.find(&TripleMatch::from_pattern(&concrete));
        Box::new(
            matches
                .filter_map(move |found| bind_triple(&concrete, &found, &binding))
                .map(Ok),
        )
    }

    /// Orders the triples of `pattern` for evaluation with `input`.
    ///
    /// If `input` binds some variables of the pattern, the substituted pattern is reordered with
    /// the knowledge of these values. Otherwise, the static selectivity order is used.
    fn order(&self, pattern: &[TriplePattern], input: &Binding) -> Vec<TriplePattern> {
        let options = self.context.options();
        let binds_pattern = pattern_variables(pattern)
            .iter()
            .any(|variable| input.contains(variable));
        if options.dynamic_optimization && binds_pattern {
            let concrete = substitute_pattern(pattern, input);
            return order_by_selectivity(&concrete, self.source, &[], OrderingHeuristic::Updated)
                .pattern;
        }
        if options.default_optimization {
            return substitute_pattern(&self.static_order(pattern), input);
        }
        substitute_pattern(pattern, input)
    }

    /// Orders `pattern` by selectivity unless the estimated treewidth of the new order is worse
    /// than the one of the written order.
    fn static_order(&self, pattern: &[TriplePattern]) -> Vec<TriplePattern> {
        let ordered = order_by_selectivity(pattern, self.source, &[], OrderingHeuristic::Static);
        let limit = self.context.options().treewidth_limit;
        if pattern.len() < 2 || pattern.len() > limit || ordered.pattern == pattern {
            return ordered.pattern;
        }

        let variables = pattern_variables(pattern);
        let variable_order = |pattern: &[TriplePattern]| -> Vec<usize> {
            pattern_variables(pattern)
                .iter()
                .filter_map(|variable| variables.iter().position(|v| v == variable))
                .collect()
        };
        let estimator =
            TreewidthEstimator::for_pattern(pattern, |triple| triple_count(triple, self.source));
        let written = estimator.calculate_width_for(&variable_order(pattern));
        let reordered = estimator.calculate_width_for(&variable_order(&ordered.pattern));
        if written >= 0 && reordered > written {
            tracing::debug!(written, reordered, "Kept the written order of a pattern");
            return pattern.to_vec();
        }
        ordered.pattern
    }
}

/// Assigns every filter to the first step after which all its variables are bound.
///
/// Step zero is before the first triple. Filters using `EXISTS` or variables that are never bound
/// are applied after the last triple.
fn filter_stages<'o>(
    ordered: &[TriplePattern],
    filters: &[&'o Expression],
    input: &Binding,
) -> Vec<Vec<&'o Expression>> {
    let mut bound: Vec<Vec<&Variable>> = Vec::with_capacity(ordered.len() + 1);
    let mut current: Vec<&Variable> = input.variables().collect();
    bound.push(current.clone());
    for triple in ordered {
        current.extend(triple_variables(triple));
        bound.push(current.clone());
    }

    let mut stages = vec![Vec::new(); ordered.len() + 1];
    for filter in filters {
        let stage = expression_variables(filter)
            .and_then(|variables| {
                bound.iter().position(|bound| {
                    variables
                        .iter()
                        .all(|variable| bound.contains(&variable))
                })
            })
            .unwrap_or(ordered.len());
        stages[stage].push(*filter);
    }
    stages
}

/// Groups the triples of `pattern` into sets that are connected by shared variables.
fn connected_components(pattern: &[TriplePattern]) -> Vec<Vec<TriplePattern>> {
    let mut components: Vec<Vec<TriplePattern>> = Vec::new();
    for triple in pattern {
        let variables: Vec<&Variable> = triple_variables(triple).collect();
        let mut merged = Vec::new();
        let mut position = None;
        let mut idx = 0;
        while idx < components.len() {
            let connected = components[idx]
                .iter()
                .flat_map(triple_variables)
                .any(|variable| variables.contains(&variable));
            if connected {
                merged.extend(components.remove(idx));
                position.get_or_insert(idx);
            } else {
                idx += 1;
            }
        }
        merged.push(triple.clone());
        components.insert(position.unwrap_or(components.len()), merged);
    }
    components
}

/// Starts with the most selective block and then prefers blocks that share a variable with the
/// blocks already placed. Unknown estimates are the least selective.
fn order_blocks(blocks: Vec<(Block, i64)>) -> Vec<Block> {
    let mut remaining: Vec<(Block, i64)> = blocks
        .into_iter()
        .map(|(block, estimate)| (block, if estimate < 0 { i64::MAX } else { estimate }))
        .collect();
    let mut bound: Vec<Variable> = Vec::new();
    let mut ordered = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let connected = |block: &Block| {
            block
                .pattern()
                .iter()
                .flat_map(triple_variables)
                .any(|variable| bound.contains(variable))
        };
        let cheapest = |candidates: &mut dyn Iterator<Item = (usize, i64)>| {
            candidates
                .fold(None, |best: Option<(usize, i64)>, (idx, estimate)| match best {
                    Some((_, best_estimate)) if best_estimate <= estimate => best,
                    _ => Some((idx, estimate)),
                })
                .map(|(idx, _)| idx)
        };
        let next = cheapest(
            &mut remaining
                .iter()
                .enumerate()
                .filter(|(_, (block, _))| connected(block))
                .map(|(idx, (_, estimate))| (idx, *estimate)),
        )
        .or_else(|| {
            cheapest(
                &mut remaining
                    .iter()
                    .enumerate()
                    .map(|(idx, (_, estimate))| (idx, *estimate)),
            )
        })
        .unwrap_or(0);
        let (block, _) = remaining.remove(next);
        for variable in pattern_variables(block.pattern()) {
            if !bound.contains(&variable) {
                bound.push(variable);
            }
        }
        ordered.push(block);
    }
    ordered
}

enum RangeBound {
    Lower(Bound<f64>),
    Upper(Bound<f64>),
}

/// Extracts the bound that `expression` puts on `variable`, if it is a comparison with a numeric
/// constant.
fn range_bound(expression: &Expression, variable: &Variable) -> Option<RangeBound> {
    let (lhs, rhs, strict, less) = match expression {
        Expression::Less(lhs, rhs) => (lhs, rhs, true, true),
        Expression::LessOrEqual(lhs, rhs) => (lhs, rhs, false, true),
        Expression::Greater(lhs, rhs) => (lhs, rhs, true, false),
        Expression::GreaterOrEqual(lhs, rhs) => (lhs, rhs, false, false),
        _ => return None,
    };
    let (value, less) = match (lhs.as_ref(), rhs.as_ref()) {
        (Expression::Variable(v), Expression::Literal(literal)) if v == variable => {
            (literal, less)
        }
        (Expression::Literal(literal), Expression::Variable(v)) if v == variable => {
            (literal, !less)
        }
        _ => return None,
    };
    let value = Numeric::from_literal(value)?.to_f64();
    if value.is_nan() {
        return None;
    }
    let bound = if strict {
        Bound::Excluded(value)
    } else {
        Bound::Included(value)
    };
    Some(if less {
        RangeBound::Upper(bound)
    } else {
        RangeBound::Lower(bound)
    })
}

/// Combines two bounds on the same side of a range into the more restrictive one.
fn tighter(current: Bound<f64>, new: Bound<f64>, lower: bool) -> Bound<f64> {
    let value = |bound: &Bound<f64>| match bound {
        Bound::Included(value) | Bound::Excluded(value) => Some(*value),
        Bound::Unbounded => None,
    };
    let (Some(current_value), Some(new_value)) = (value(&current), value(&new)) else {
        return if current == Bound::Unbounded { new } else { current };
    };
    if current_value == new_value {
        return if matches!(new, Bound::Excluded(_)) { new } else { current };
    }
    if (new_value > current_value) == lower {
        new
    } else {
        current
    }
}
