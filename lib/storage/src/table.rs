use parliament_common::{GraphCapabilities, TripleMatch, TriplePosition, TripleSource};
use parliament_model::{NamedNode, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

/// The triples of one graph together with one lookup map per triple position.
///
/// A scan picks the smallest bucket among the constants of the pattern and filters it. This
/// mirrors choosing the index permutation with the best scan score, as each bucket is an exact
/// answer for its own position.
#[derive(Debug, Default)]
pub struct TripleTable {
    triples: FxHashSet<Triple>,
    by_subject: FxHashMap<Term, FxHashSet<Triple>>,
    by_predicate: FxHashMap<NamedNode, FxHashSet<Triple>>,
    by_object: FxHashMap<Term, FxHashSet<Triple>>,
}

impl TripleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a triple. Returns false if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if !self.triples.insert(triple.clone()) {
            return false;
        }
        self.by_subject
            .entry(triple.subject.clone().into())
            .or_default()
            .insert(triple.clone());
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .insert(triple.clone());
        self.by_object
            .entry(triple.object.clone())
            .or_default()
            .insert(triple);
        true
    }

    /// Removes a triple. Returns false if it was not present.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        if !self.triples.remove(triple) {
            return false;
        }
        remove_from_bucket(&mut self.by_subject, &triple.subject.clone().into(), triple);
        remove_from_bucket(&mut self.by_predicate, &triple.predicate, triple);
        remove_from_bucket(&mut self.by_object, &triple.object, triple);
        true
    }

    pub fn clear(&mut self) {
        self.triples.clear();
        self.by_subject.clear();
        self.by_predicate.clear();
        self.by_object.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    fn bucket(&self, term: &Term, position: TriplePosition) -> Option<&FxHashSet<Triple>> {
        match position {
            TriplePosition::Subject => self.by_subject.get(term),
            TriplePosition::Predicate => match term {
                Term::NamedNode(node) => self.by_predicate.get(node),
                _ => None,
            },
            TriplePosition::Object => self.by_object.get(term),
        }
    }
}

fn remove_from_bucket<K: Eq + Hash>(
    map: &mut FxHashMap<K, FxHashSet<Triple>>,
    key: &K,
    triple: &Triple,
) {
    if let Some(bucket) = map.get_mut(key) {
        bucket.remove(triple);
        if bucket.is_empty() {
            map.remove(key);
        }
    }
}

impl TripleSource for TripleTable {
    fn find(&self, pattern: &TripleMatch) -> Box<dyn Iterator<Item = Triple> + '_> {
        let constants = pattern.constants();
        if constants.is_empty() {
            return Box::new(self.triples.iter().cloned());
        }

        let mut smallest: Option<&FxHashSet<Triple>> = None;
        for (term, position) in &constants {
            match self.bucket(term, *position) {
                None => return Box::new(std::iter::empty()),
                Some(bucket) => {
                    if smallest.map_or(true, |s| bucket.len() < s.len()) {
                        smallest = Some(bucket);
                    }
                }
            }
        }

        let pattern = pattern.clone();
        Box::new(
            smallest
                .into_iter()
                .flatten()
                .filter(move |triple| pattern.matches(triple))
                .cloned(),
        )
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    fn count_in_position(&self, node: &Term, position: TriplePosition) -> i64 {
        let count = self.bucket(node, position).map_or(0, FxHashSet::len);
        i64::try_from(count).unwrap_or(i64::MAX)
    }

    fn len(&self) -> usize {
        self.triples.len()
    }

    fn capabilities(&self) -> GraphCapabilities {
        GraphCapabilities {
            literal_typed_equality: false,
            exact_counts: true,
        }
    }
}
