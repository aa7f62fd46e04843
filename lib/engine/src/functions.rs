use parliament_common::{QueryResult, TripleSource};
use parliament_model::{Binding, NamedNode, TermPattern, TriplePattern};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A property function that is evaluated without an index.
///
/// A call `subject <uri> object` is evaluated once per incoming solution. The arguments already
/// have the variables of that solution substituted.
///
/// The triples of a query that describe an argument with one of the
/// [operand predicates](Self::operand_predicates), e.g., `_:b pt:asInterval "..."`, belong to the
/// call. The function reads those returned by [described](Self::described) itself. All others are
/// matched against the graph before the function is executed.
pub trait PropertyFunction: Send + Sync {
    fn uri(&self) -> &NamedNode;

    fn operand_predicates(&self) -> &[NamedNode] {
        &[]
    }

    /// Returns the triples of `pattern` that the function reads instead of the graph.
    fn described(
        &self,
        _subject: &TermPattern,
        _object: &TermPattern,
        _pattern: &[TriplePattern],
    ) -> Vec<TriplePattern> {
        Vec::new()
    }

    /// Returns the solutions of the call. Every solution must extend `binding`.
    ///
    /// `described` holds the triples returned by [described](Self::described) for this call.
    fn execute(
        &self,
        subject: &TermPattern,
        object: &TermPattern,
        described: &[TriplePattern],
        binding: &Binding,
        source: &dyn TripleSource,
    ) -> QueryResult<Vec<Binding>>;
}

/// The generic property functions known to a store.
#[derive(Clone, Default)]
pub struct PropertyFunctionRegistry {
    functions: FxHashMap<NamedNode, Arc<dyn PropertyFunction>>,
}

impl PropertyFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function`, replacing any function with the same URI.
    pub fn register(&mut self, function: Arc<dyn PropertyFunction>) {
        self.functions.insert(function.uri().clone(), function);
    }

    pub fn unregister(&mut self, uri: &NamedNode) -> bool {
        self.functions.remove(uri).is_some()
    }

    pub fn get(&self, uri: &NamedNode) -> Option<&Arc<dyn PropertyFunction>> {
        self.functions.get(uri)
    }

    /// The URIs of the functions together with their operand predicates.
    pub fn call_shapes(&self) -> impl Iterator<Item = (NamedNode, Vec<NamedNode>)> + '_ {
        self.functions
            .iter()
            .map(|(uri, function)| (uri.clone(), function.operand_predicates().to_vec()))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for PropertyFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}
