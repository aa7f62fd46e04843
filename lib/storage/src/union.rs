use parliament_common::{GraphCapabilities, TripleMatch, TriplePosition, TripleSource};
use parliament_model::{Term, Triple};
use rustc_hash::FxHashSet;

/// Exposes the union of two triple sources.
///
/// The position counts of a union are estimated as the minimum of both branches. If one branch
/// cannot report a count, the count of the other branch is used.
pub struct UnionSource<'a> {
    left: &'a dyn TripleSource,
    right: &'a dyn TripleSource,
}

impl<'a> UnionSource<'a> {
    pub fn new(left: &'a dyn TripleSource, right: &'a dyn TripleSource) -> Self {
        Self { left, right }
    }
}

/// Combines two selectivity estimates of the branches of a union. `-1` stands for unknown.
pub fn union_estimate(left: i64, right: i64) -> i64 {
    match (left < 0, right < 0) {
        (true, true) => -1,
        (true, false) => right,
        (false, true) => left,
        (false, false) => left.min(right),
    }
}

impl TripleSource for UnionSource<'_> {
    fn find(&self, pattern: &TripleMatch) -> Box<dyn Iterator<Item = Triple> + '_> {
        let mut seen = FxHashSet::default();
        Box::new(
            self.left
                .find(pattern)
                .chain(self.right.find(pattern))
                .filter(move |triple| seen.insert(triple.clone())),
        )
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.left.contains(triple) || self.right.contains(triple)
    }

    fn count_in_position(&self, node: &Term, position: TriplePosition) -> i64 {
        union_estimate(
            self.left.count_in_position(node, position),
            self.right.count_in_position(node, position),
        )
    }

    fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    fn capabilities(&self) -> GraphCapabilities {
        let left = self.left.capabilities();
        let right = self.right.capabilities();
        GraphCapabilities {
            literal_typed_equality: left.literal_typed_equality
                && right.literal_typed_equality,
            exact_counts: false,
        }
    }
}
