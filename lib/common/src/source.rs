use parliament_model::{NamedNode, NamedNodePattern, Term, TermPattern, Triple, TriplePattern};

/// A position within a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriplePosition {
    Subject,
    Predicate,
    Object,
}

/// The constants of a triple pattern. Variables are represented as [None].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TripleMatch {
    pub subject: Option<Term>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Term>,
}

impl TripleMatch {
    pub fn new(subject: Option<Term>, predicate: Option<NamedNode>, object: Option<Term>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    pub fn from_pattern(pattern: &TriplePattern) -> Self {
        let predicate = match &pattern.predicate {
            NamedNodePattern::NamedNode(node) => Some(node.clone()),
            NamedNodePattern::Variable(_) => None,
        };
        Self {
            subject: constant(&pattern.subject),
            predicate,
            object: constant(&pattern.object),
        }
    }

    /// Returns the constants of this match together with their positions.
    pub fn constants(&self) -> Vec<(Term, TriplePosition)> {
        let mut result = Vec::with_capacity(3);
        if let Some(subject) = &self.subject {
            result.push((subject.clone(), TriplePosition::Subject));
        }
        if let Some(predicate) = &self.predicate {
            result.push((predicate.clone().into(), TriplePosition::Predicate));
        }
        if let Some(object) = &self.object {
            result.push((object.clone(), TriplePosition::Object));
        }
        result
    }

    pub fn matches(&self, triple: &Triple) -> bool {
        self.subject
            .as_ref()
            .map_or(true, |s| *s == Term::from(triple.subject.clone()))
            && self.predicate.as_ref().map_or(true, |p| *p == triple.predicate)
            && self.object.as_ref().map_or(true, |o| *o == triple.object)
    }
}

fn constant(pattern: &TermPattern) -> Option<Term> {
    parliament_model::pattern_to_term(pattern)
}

/// Which optional semantics a graph implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphCapabilities {
    /// Whether literals are compared by value instead of by their lexical form.
    pub literal_typed_equality: bool,
    /// Whether [TripleSource::count_in_position] returns exact counts.
    pub exact_counts: bool,
}

/// Read access to the triples of a graph.
///
/// Implementations are expected to answer [Self::count_in_position] cheaply, as it is used by
/// the cost model for every reordering step.
pub trait TripleSource {
    /// Returns all triples matching `pattern`.
    fn find(&self, pattern: &TripleMatch) -> Box<dyn Iterator<Item = Triple> + '_>;

    /// Returns whether `triple` is contained in the source.
    fn contains(&self, triple: &Triple) -> bool {
        self.find(&TripleMatch::new(
            Some(triple.subject.clone().into()),
            Some(triple.predicate.clone()),
            Some(triple.object.clone()),
        ))
        .next()
        .is_some()
    }

    /// Returns the number of triples that have `node` in `position`, or `-1` if unknown.
    fn count_in_position(&self, node: &Term, position: TriplePosition) -> i64;

    /// Returns the total number of triples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capabilities(&self) -> GraphCapabilities;
}
