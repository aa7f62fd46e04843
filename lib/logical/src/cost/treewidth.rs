use parliament_model::{triple_variables, TriplePattern, Variable};
use rustc_hash::FxHashMap;

/// The default maximum number of triples for which the estimator is run.
pub const DEFAULT_TREEWIDTH_LIMIT: usize = 24;

/// The estimator tracks used constraints in a bit set.
const MAX_CONSTRAINTS: usize = 64;

/// Above this many optional constraints per variable, all of them are deferred.
const MAX_LOCAL_CHOICES: usize = 16;

/// A join constraint over a set of variables.
///
/// `max_product` bounds the number of distinct combinations of values the constraint allows for its
/// variables, e.g., the number of triples matching a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    variables: Vec<usize>,
    max_product: i64,
}

impl Constraint {
    /// Creates a new constraint. Products below one are raised to one.
    pub fn new(variables: impl IntoIterator<Item = usize>, max_product: i64) -> Self {
        let mut variables: Vec<usize> = variables.into_iter().collect();
        variables.sort_unstable();
        variables.dedup();
        Self {
            variables,
            max_product: max_product.max(1),
        }
    }

    pub fn variables(&self) -> &[usize] {
        &self.variables
    }

    pub fn max_product(&self) -> i64 {
        self.max_product
    }
}

/// Estimates the size of the largest intermediate result when the variables of a join are bound in
/// a given order.
///
/// Every constraint is applied once, at one of its variables. Once applied, a constraint stays in
/// effect until its last variable in the order is bound. The cost of a step is the product of the
/// constraints in effect, the cost of an order is the cost of its most expensive step. For every
/// variable, the estimator tries all combinations of applying the constraints touching it now or
/// deferring them to a later variable and returns the cheapest outcome.
///
/// Adding a constraint never decreases the estimate.
#[derive(Debug, Clone, Default)]
pub struct TreewidthEstimator {
    variable_count: usize,
    constraints: Vec<Constraint>,
}

impl TreewidthEstimator {
    pub fn new(variable_count: usize) -> Self {
        Self {
            variable_count,
            constraints: Vec::new(),
        }
    }

    /// Creates an estimator with one constraint per triple pattern.
    ///
    /// Variables are numbered in order of their first appearance in `pattern`. `count` provides the
    /// maximum product of a triple, [i64::MAX] if nothing is known.
    pub fn for_pattern(pattern: &[TriplePattern], count: impl Fn(&TriplePattern) -> i64) -> Self {
        let mut variables: Vec<&Variable> = Vec::new();
        let mut constraints = Vec::with_capacity(pattern.len());
        for triple in pattern {
            let mut ids = Vec::new();
            for variable in triple_variables(triple) {
                let id = match variables.iter().position(|v| *v == variable) {
                    Some(id) => id,
                    None => {
                        variables.push(variable);
                        variables.len() - 1
                    }
                };
                ids.push(id);
            }
            constraints.push(Constraint::new(ids, count(triple)));
        }
        Self {
            variable_count: variables.len(),
            constraints,
        }
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn push_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn pop_constraint(&mut self) -> Option<Constraint> {
        self.constraints.pop()
    }

    /// Estimates the cost of binding the variables in ascending order.
    pub fn calculate_width(&self) -> i64 {
        let order: Vec<usize> = (0..self.variable_count).collect();
        self.calculate_width_for(&order)
    }

    /// Estimates the cost of binding the variables in `order`.
    ///
    /// Variables that are missing from `order` are treated as constants. Returns `-1` if there are
    /// too many constraints to estimate.
    pub fn calculate_width_for(&self, order: &[usize]) -> i64 {
        if self.constraints.len() > MAX_CONSTRAINTS {
            return -1;
        }
        let position_of = |variable: usize| order.iter().position(|v| *v == variable);
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); order.len()];
        let mut last = vec![0; self.constraints.len()];
        for (idx, constraint) in self.constraints.iter().enumerate() {
            let positions: Vec<usize> = constraint
                .variables
                .iter()
                .filter_map(|variable| position_of(*variable))
                .collect();
            for position in &positions {
                buckets[*position].push(idx);
            }
            last[idx] = positions.iter().copied().max().unwrap_or(0);
        }
        let search = Search {
            constraints: &self.constraints,
            buckets: &buckets,
            last: &last,
            memo: FxHashMap::default(),
        };
        search.run()
    }
}

struct Search<'a> {
    constraints: &'a [Constraint],
    /// The constraints touching the variable at each position.
    buckets: &'a [Vec<usize>],
    /// The position of the last variable of each constraint.
    last: &'a [usize],
    memo: FxHashMap<(usize, u64), i64>,
}

impl Search<'_> {
    fn run(mut self) -> i64 {
        if self.buckets.is_empty() {
            return 1;
        }
        self.cost_from(0, 0)
    }

    /// The cheapest cost of the steps from `position` on, given the constraints in `used`.
    fn cost_from(&mut self, position: usize, used: u64) -> i64 {
        if position == self.buckets.len() {
            return 0;
        }
        if let Some(cost) = self.memo.get(&(position, used)) {
            return *cost;
        }

        let bucket = &self.buckets[position];
        let mut required = used;
        let mut optional = Vec::new();
        for idx in bucket {
            let bit = 1 << idx;
            if used & bit != 0 {
                continue;
            }
            if self.last[*idx] == position {
                required |= bit;
            } else {
                optional.push(bit);
            }
        }

        if optional.len() > MAX_LOCAL_CHOICES {
            optional.clear();
        }

        let mut best = i64::MAX;
        for choice in 0..(1_u64 << optional.len()) {
            let mut applied = required;
            for (idx, bit) in optional.iter().enumerate() {
                if choice & (1 << idx) != 0 {
                    applied |= bit;
                }
            }
            let step = self.step_cost(position, applied);
            if step >= best {
                continue;
            }
            let rest = self.cost_from(position + 1, applied);
            best = best.min(step.max(rest));
        }

        self.memo.insert((position, used), best);
        best
    }

    /// The product of the applied constraints that are still in effect at `position`.
    fn step_cost(&self, position: usize, applied: u64) -> i64 {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(idx, _)| applied & (1 << idx) != 0 && self.last[*idx] >= position)
            .fold(1_i64, |product, (_, constraint)| {
                product.saturating_mul(constraint.max_product)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> TreewidthEstimator {
        let mut estimator = TreewidthEstimator::new(4);
        estimator.push_constraint(Constraint::new([0, 1], 10));
        estimator.push_constraint(Constraint::new([1, 2], 20));
        estimator.push_constraint(Constraint::new([2, 3], 5));
        estimator
    }

    #[test]
    fn chain_width_is_largest_constraint() {
        assert_eq!(chain().calculate_width(), 20);
    }

    #[test]
    fn order_matters() {
        let estimator = chain();
        assert_eq!(estimator.calculate_width_for(&[0, 3, 1, 2]), 100);
    }

    #[test]
    fn adding_constraints_never_decreases_the_width() {
        let mut estimator = chain();
        let mut previous = estimator.calculate_width();
        for constraint in [
            Constraint::new([0, 3], 2),
            Constraint::new([1], 1),
            Constraint::new([0, 2, 3], 7),
            Constraint::new([3], 0),
        ] {
            estimator.push_constraint(constraint);
            let width = estimator.calculate_width();
            assert!(width >= previous, "{width} < {previous}");
            previous = width;
        }
    }

    #[test]
    fn unknown_counts_saturate() {
        let mut estimator = TreewidthEstimator::new(2);
        estimator.push_constraint(Constraint::new([0, 1], i64::MAX));
        estimator.push_constraint(Constraint::new([1], 3));
        assert_eq!(estimator.calculate_width(), i64::MAX);
    }

    #[test]
    fn too_many_constraints_are_unknown() {
        let mut estimator = TreewidthEstimator::new(1);
        for _ in 0..=MAX_CONSTRAINTS {
            estimator.push_constraint(Constraint::new([0], 1));
        }
        assert_eq!(estimator.calculate_width(), -1);
    }
}
