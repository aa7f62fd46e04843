use crate::functions::PropertyFunctionRegistry;
use crate::options::QueryOptions;
use parliament_common::{CancellationFlag, TripleSource};
use parliament_index::IndexSet;
use parliament_model::NamedNode;
use std::fmt;

/// A named graph that can be addressed with `GRAPH`.
pub struct NamedGraphSource<'a> {
    pub name: NamedNode,
    pub source: &'a dyn TripleSource,
    pub indexes: IndexSet,
}

/// Everything the executor needs to evaluate a query.
///
/// The context borrows the triple sources, so callers must hold the read locks of the underlying
/// graphs for as long as the context lives.
pub struct ExecutionContext<'a> {
    source: &'a dyn TripleSource,
    indexes: IndexSet,
    property_functions: PropertyFunctionRegistry,
    options: QueryOptions,
    cancellation: CancellationFlag,
    named_graphs: Vec<NamedGraphSource<'a>>,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context that evaluates queries against `source` without any index.
    pub fn new(source: &'a dyn TripleSource) -> Self {
        Self {
            source,
            indexes: IndexSet::empty(),
            property_functions: PropertyFunctionRegistry::new(),
            options: QueryOptions::default(),
            cancellation: CancellationFlag::new(),
            named_graphs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_indexes(mut self, indexes: IndexSet) -> Self {
        self.indexes = indexes;
        self
    }

    #[must_use]
    pub fn with_property_functions(mut self, property_functions: PropertyFunctionRegistry) -> Self {
        self.property_functions = property_functions;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Adds a named graph. A graph with the same name replaces the previous one.
    #[must_use]
    pub fn with_named_graph(
        mut self,
        name: NamedNode,
        source: &'a dyn TripleSource,
        indexes: IndexSet,
    ) -> Self {
        self.named_graphs.retain(|graph| graph.name != name);
        self.named_graphs.push(NamedGraphSource {
            name,
            source,
            indexes,
        });
        self
    }

    /// The default graph.
    pub fn source(&self) -> &'a dyn TripleSource {
        self.source
    }

    /// The indexes of the default graph.
    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    pub fn property_functions(&self) -> &PropertyFunctionRegistry {
        &self.property_functions
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    pub fn named_graphs(&self) -> &[NamedGraphSource<'a>] {
        &self.named_graphs
    }

    pub fn named_graph(&self, name: &NamedNode) -> Option<&NamedGraphSource<'a>> {
        self.named_graphs.iter().find(|graph| graph.name == *name)
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("indexes", &self.indexes)
            .field("property_functions", &self.property_functions)
            .field("options", &self.options)
            .field(
                "named_graphs",
                &self
                    .named_graphs
                    .iter()
                    .map(|graph| &graph.name)
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
