//! The [`Store`] ties the graphs, their secondary indexes and the query engine together.
//!
//! Usage example:
//! ```
//! use parliament::model::{GraphPattern, Literal, NamedNode, Triple, TriplePattern, Variable};
//! use parliament::engine::QueryOptions;
//! use parliament::store::Store;
//!
//! let store = Store::new();
//! let alice = NamedNode::new("http://example.com/alice")?;
//! let name = NamedNode::new("http://example.com/name")?;
//! store.insert(Triple::new(alice.clone(), name.clone(), Literal::from("Alice")))?;
//!
//! let pattern = GraphPattern::Bgp {
//!     patterns: vec![TriplePattern {
//!         subject: Variable::new("person")?.into(),
//!         predicate: name.into(),
//!         object: Variable::new("name")?.into(),
//!     }],
//! };
//! let solutions = store.query(&pattern, QueryOptions::default())?;
//! assert_eq!(solutions.len(), 1);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

use crate::error::StoreError;
use parking_lot::RwLock;
use parliament_common::error::QueryEvaluationError;
use parliament_common::{QueryResult, TripleSource};
use parliament_engine::{
    execute, ExecutionContext, PropertyFunction, PropertyFunctionRegistry, QueryHandle,
    QueryOptions, QueryState, QueryTracker,
};
use parliament_index::numeric::numeric_factory;
use parliament_index::{
    AnyIndexFactory, FactoryConfig, IndexFactoryRegistry, IndexManager, IndexSet,
};
use parliament_logical::rewrite::{RewriteContext, Rewriter};
use parliament_logical::Op;
use parliament_model::{Binding, GraphPattern, NamedNode, Triple};
use parliament_storage::{Graph, TripleTable, UnionSource};
use parliament_temporal::{graph_property_functions, temporal_factory};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The id of the constructor of numeric index factories.
pub const NUMERIC_INDEX: &str = "numeric";
/// The id of the constructor of temporal index factories.
pub const TEMPORAL_INDEX: &str = "temporal";

/// A named graph visible to a query.
type NamedSource<'a> = (NamedNode, &'a dyn TripleSource, IndexSet);

/// An in-memory RDF store with a default graph, named graphs and their secondary indexes.
///
/// Every graph has its own lock. Updates take the write lock of a single graph and notify the
/// indexes of that graph while holding it. A query holds the read locks of all graphs it can see
/// until its solutions are materialized, so it observes one consistent state of the store. The
/// read locks of named graphs are always taken in the order of their names.
pub struct Store {
    default_graph: Arc<Graph>,
    named_graphs: RwLock<BTreeMap<NamedNode, Arc<Graph>>>,
    indexes: IndexManager,
    factories: RwLock<IndexFactoryRegistry>,
    property_functions: RwLock<PropertyFunctionRegistry>,
    tracker: QueryTracker,
}

impl Store {
    /// Creates an empty store without indexes.
    ///
    /// The temporal relations are registered as property functions that read the extents from the
    /// graph. A temporal index takes over for the graphs it covers.
    pub fn new() -> Self {
        let mut property_functions = PropertyFunctionRegistry::new();
        for function in graph_property_functions() {
            property_functions.register(function);
        }
        Self {
            default_graph: Arc::new(Graph::new()),
            named_graphs: RwLock::new(BTreeMap::new()),
            indexes: IndexManager::new(),
            factories: RwLock::new(factory_registry()),
            property_functions: RwLock::new(property_functions),
            tracker: QueryTracker::new(),
        }
    }

    /// Configures index factories from their ids and properties.
    ///
    /// Known ids are [`NUMERIC_INDEX`] and [`TEMPORAL_INDEX`]. Every enabled factory immediately
    /// creates an index for each existing graph and for every graph created afterward. Unknown ids
    /// and invalid configurations are skipped. Configuring the same factory again keeps the
    /// existing indexes. Returns the number of configured factories.
    pub fn configure_indexes(&self, entries: &[FactoryConfig]) -> usize {
        let mut configured = factory_registry();
        let count = configured.configure(entries);
        for factory in configured.enabled_factories() {
            self.register_index_factory(factory);
        }
        count
    }

    /// Registers a configured index factory and indexes all existing graphs with it.
    ///
    /// Returns the number of created indexes. Indexes that could not be created are skipped.
    pub fn register_index_factory(&self, factory: Arc<dyn AnyIndexFactory>) -> usize {
        self.factories.write().register(Arc::clone(&factory));
        let mut created = 0;
        for graph in self.graphs() {
            let result = factory
                .create_handle(&graph)
                .and_then(|handle| self.indexes.register(&graph, handle));
            match result {
                Ok(true) => created += 1,
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(factory = factory.label(), error = %error, "Could not index graph, skipping");
                }
            }
        }
        tracing::info!(factory = factory.label(), created, "Registered index factory");
        created
    }

    /// The labels of the indexes of the default graph or of the named graph `name`.
    pub fn index_labels(&self, name: Option<&NamedNode>) -> Result<Vec<String>, StoreError> {
        let graph = match name {
            Some(name) => self.named_graph(name)?,
            None => Arc::clone(&self.default_graph),
        };
        Ok(self
            .indexes
            .get_indexes(&graph)
            .iter()
            .map(|index| index.label().to_owned())
            .collect())
    }

    pub fn register_property_function(&self, function: Arc<dyn PropertyFunction>) {
        tracing::debug!(uri = %function.uri(), "Registered property function");
        self.property_functions.write().register(function);
    }

    pub fn unregister_property_function(&self, uri: &NamedNode) -> bool {
        self.property_functions.write().unregister(uri)
    }

    /// Adds a triple to the default graph. Returns whether the triple was new.
    pub fn insert(&self, triple: Triple) -> Result<bool, StoreError> {
        Ok(self.default_graph.insert(triple)?)
    }

    /// Removes a triple from the default graph. Returns whether the triple was present.
    pub fn remove(&self, triple: &Triple) -> Result<bool, StoreError> {
        Ok(self.default_graph.remove(triple)?)
    }

    /// Removes all triples from the default graph.
    pub fn clear(&self) -> Result<(), StoreError> {
        Ok(self.default_graph.clear()?)
    }

    /// The number of triples in the default graph.
    pub fn len(&self) -> usize {
        self.default_graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.default_graph.is_empty()
    }

    pub fn insert_into(&self, graph: &NamedNode, triple: Triple) -> Result<bool, StoreError> {
        Ok(self.named_graph(graph)?.insert(triple)?)
    }

    pub fn remove_from(&self, graph: &NamedNode, triple: &Triple) -> Result<bool, StoreError> {
        Ok(self.named_graph(graph)?.remove(triple)?)
    }

    /// Creates an empty named graph together with the indexes of all enabled factories.
    pub fn create_named_graph(&self, name: NamedNode) -> Result<(), StoreError> {
        let mut graphs = self.named_graphs.write();
        if graphs.contains_key(&name) {
            return Err(StoreError::GraphExists(name));
        }
        let graph = Arc::new(Graph::named(name.clone()));
        let indexes = self
            .indexes
            .create_and_register_all(&graph, &self.factories.read());
        tracing::debug!(graph = %name, indexes, "Created named graph");
        graphs.insert(name, graph);
        Ok(())
    }

    /// Drops a named graph and deletes its indexes.
    pub fn drop_named_graph(&self, name: &NamedNode) -> Result<(), StoreError> {
        let Some(graph) = self.named_graphs.write().remove(name) else {
            return Err(StoreError::UnknownGraph(name.clone()));
        };
        for handle in self.indexes.unregister_all(&graph)? {
            handle.delete()?;
        }
        tracing::debug!(graph = %name, "Dropped named graph");
        Ok(())
    }

    pub fn contains_named_graph(&self, name: &NamedNode) -> bool {
        self.named_graphs.read().contains_key(name)
    }

    /// The names of all named graphs in their lock order.
    pub fn named_graph_names(&self) -> Vec<NamedNode> {
        self.named_graphs.read().keys().cloned().collect()
    }

    /// Evaluates `pattern` against the default graph.
    ///
    /// The named graphs of the store are available to `GRAPH` patterns. Anonymous variables that
    /// were introduced while rewriting the query are removed from the solutions.
    pub fn query(
        &self,
        pattern: &GraphPattern,
        options: QueryOptions,
    ) -> Result<Vec<Binding>, StoreError> {
        self.track(pattern, |handle| {
            let op = Op::from_graph_pattern(pattern)?;
            let default_graph = self.default_graph.read();
            let graphs = self.named_graphs.read();
            let guards: Vec<_> = graphs
                .iter()
                .map(|(name, graph)| (name, graph, graph.read()))
                .collect();
            let named: Vec<NamedSource<'_>> = guards
                .iter()
                .map(|(name, graph, guard)| {
                    let source: &dyn TripleSource = guard;
                    ((*name).clone(), source, self.indexes.index_set(graph))
                })
                .collect();
            self.evaluate(
                handle,
                op,
                &default_graph,
                self.indexes.index_set(&self.default_graph),
                &named,
                options,
            )
        })
    }

    /// Evaluates `pattern` against the union of the given named graphs.
    ///
    /// Indexes are not used, as every index only covers a single graph.
    pub fn query_union(
        &self,
        graphs: &[NamedNode],
        pattern: &GraphPattern,
        options: QueryOptions,
    ) -> Result<Vec<Binding>, StoreError> {
        let all = self.named_graphs.read();
        if let Some(unknown) = graphs.iter().find(|name| !all.contains_key(*name)) {
            return Err(StoreError::UnknownGraph(unknown.clone()));
        }
        self.track(pattern, |handle| {
            let op = Op::from_graph_pattern(pattern)?;
            let guards: Vec<_> = all
                .iter()
                .filter(|(name, _)| graphs.contains(*name))
                .map(|(_, graph)| graph.read())
                .collect();
            let mut sources: Vec<&dyn TripleSource> = Vec::with_capacity(guards.len());
            for guard in &guards {
                sources.push(guard);
            }
            with_union(&sources, &mut |source: &dyn TripleSource| {
                self.evaluate(handle, op.clone(), source, IndexSet::empty(), &[], options)
            })
        })
    }

    /// Cancels the running query with `id`. Returns whether such a query was found.
    pub fn cancel(&self, id: u64) -> bool {
        self.tracker.cancel(id)
    }

    /// The queries that are currently evaluated.
    pub fn running_queries(&self) -> Vec<Arc<QueryHandle>> {
        self.tracker
            .ids()
            .into_iter()
            .filter_map(|id| self.tracker.get(id))
            .collect()
    }

    /// Persists pending changes of all indexes.
    pub fn flush(&self) -> Result<(), StoreError> {
        Ok(self.indexes.flush_all()?)
    }

    /// Cancels all running queries and closes all indexes.
    pub fn close(&self) -> Result<(), StoreError> {
        self.tracker.cancel_all();
        Ok(self.indexes.close_all()?)
    }

    fn named_graph(&self, name: &NamedNode) -> Result<Arc<Graph>, StoreError> {
        self.named_graphs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownGraph(name.clone()))
    }

    fn graphs(&self) -> Vec<Arc<Graph>> {
        let mut graphs = vec![Arc::clone(&self.default_graph)];
        graphs.extend(self.named_graphs.read().values().cloned());
        graphs
    }

    /// Runs a query under a new handle of the tracker.
    fn track(
        &self,
        pattern: &GraphPattern,
        run: impl FnOnce(&QueryHandle) -> QueryResult<Vec<Binding>>,
    ) -> Result<Vec<Binding>, StoreError> {
        let handle = self.tracker.create(pattern.to_string());
        let result = if handle.start() {
            run(&handle)
        } else {
            Err(QueryEvaluationError::Cancelled)
        };
        let result = match result {
            Ok(solutions) => match handle.finish() {
                QueryState::Finished => {
                    tracing::debug!(query = handle.id(), solutions = solutions.len(), "Finished query");
                    Ok(solutions)
                }
                state => {
                    tracing::debug!(query = handle.id(), %state, "Query ended before it finished");
                    Err(QueryEvaluationError::Cancelled)
                }
            },
            Err(error) => {
                handle.fail(&error);
                tracing::debug!(query = handle.id(), error = %error, "Query failed");
                Err(error)
            }
        };
        self.tracker.remove(handle.id());
        Ok(result?)
    }

    fn evaluate(
        &self,
        handle: &QueryHandle,
        op: Op,
        source: &dyn TripleSource,
        indexes: IndexSet,
        named: &[NamedSource<'_>],
        options: QueryOptions,
    ) -> QueryResult<Vec<Binding>> {
        let functions = self.property_functions.read().clone();
        let rewrite_context = RewriteContext::new(indexes.clone(), functions.call_shapes());
        let op = Rewriter::new(&options.rewrite).rewrite(op, &rewrite_context)?;
        tracing::debug!(query = handle.id(), plan = %op, "Executing plan");

        let mut context = ExecutionContext::new(source)
            .with_indexes(indexes)
            .with_property_functions(functions)
            .with_options(options)
            .with_cancellation(handle.cancellation().clone());
        for (name, source, indexes) in named {
            context = context.with_named_graph(name.clone(), *source, indexes.clone());
        }
        let solutions = execute(&op, &context)?
            .map(|solution| solution.map(|binding| binding.without_anonymous()))
            .collect();
        solutions
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("default_graph", &self.default_graph)
            .field("named_graphs", &self.named_graph_names())
            .field("indexes", &self.indexes)
            .finish_non_exhaustive()
    }
}

/// The registry with the constructors of all built-in index factories.
fn factory_registry() -> IndexFactoryRegistry {
    let mut registry = IndexFactoryRegistry::new();
    registry.add_constructor(NUMERIC_INDEX, numeric_factory);
    registry.add_constructor(TEMPORAL_INDEX, temporal_factory);
    registry
}

/// Calls `f` with the union of `sources`.
fn with_union<R>(
    sources: &[&dyn TripleSource],
    f: &mut dyn FnMut(&dyn TripleSource) -> R,
) -> R {
    match sources {
        [] => f(&TripleTable::new()),
        [source] => f(*source),
        [first, rest @ ..] => with_union(rest, &mut |rest: &dyn TripleSource| {
            f(&UnionSource::new(*first, rest))
        }),
    }
}
