use crate::factory::IndexFactoryRegistry;
use crate::handle::{IndexHandle, IndexListener};
use crate::lifecycle::IndexState;
use crate::set::IndexSet;
use parking_lot::RwLock;
use parliament_common::{IndexResult, TripleSource};
use parliament_model::NamedNode;
use parliament_storage::{Graph, GraphId, ListenerId};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Identifies the graph an index belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphKey {
    pub id: GraphId,
    pub name: Option<NamedNode>,
}

impl GraphKey {
    pub fn of(graph: &Graph) -> Self {
        Self {
            id: graph.id(),
            name: graph.name().cloned(),
        }
    }
}

impl fmt::Display for GraphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "default graph ({})", self.id),
        }
    }
}

struct RegisteredIndex {
    handle: Arc<dyn IndexHandle>,
    listener: ListenerId,
}

/// Keeps track of the indexes of all graphs of a store.
///
/// Registering an index opens it, rebuilds it from the graph and attaches a listener to the graph,
/// so that the index sees every later mutation. All of this happens while the write lock
/// of the graph is held. No mutation can slip between the initial fill and the listener.
#[derive(Default)]
pub struct IndexManager {
    indexes: RwLock<FxHashMap<GraphKey, Vec<RegisteredIndex>>>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and registers an index for `graph` with every enabled factory of `registry`.
    ///
    /// Indexes that are already registered for `graph` are skipped. Failures are logged and
    /// skipped too. Returns the number of registered indexes.
    pub fn create_and_register_all(&self, graph: &Graph, registry: &IndexFactoryRegistry) -> usize {
        let mut count = 0;
        for factory in registry.enabled_factories() {
            let result = factory
                .create_handle(graph)
                .and_then(|handle| self.register(graph, handle));
            match result {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(
                        factory = factory.label(),
                        graph = %GraphKey::of(graph),
                        error = %error,
                        "Could not create index, skipping"
                    );
                }
            }
        }
        count
    }

    /// Registers `handle` as an index of `graph`.
    ///
    /// Returns `false` without touching `handle` if an index with the same label is already
    /// registered for `graph`.
    pub fn register(&self, graph: &Graph, handle: Arc<dyn IndexHandle>) -> IndexResult<bool> {
        if self.contains(graph, handle.label()) {
            tracing::debug!(index = handle.label(), graph = %GraphKey::of(graph), "Index is already registered");
            return Ok(false);
        }
        if handle.state() == IndexState::Created {
            handle.open()?;
        }

        let mut guard = graph.write();
        let records = handle.index_triples(&mut guard.iter().cloned())?;
        tracing::debug!(
            index = handle.label(),
            graph = %GraphKey::of(graph),
            triples = guard.len(),
            records,
            exact = handle.is_exact(),
            "Built index from graph content"
        );
        let listener = guard.add_listener(Arc::new(IndexListener(Arc::clone(&handle))));
        drop(guard);

        tracing::debug!(index = handle.label(), graph = %GraphKey::of(graph), "Registered index");
        self.indexes
            .write()
            .entry(GraphKey::of(graph))
            .or_default()
            .push(RegisteredIndex { handle, listener });
        Ok(true)
    }

    /// Returns whether an index with `label` is registered for `graph`.
    pub fn contains(&self, graph: &Graph, label: &str) -> bool {
        self.indexes
            .read()
            .get(&GraphKey::of(graph))
            .is_some_and(|registered| registered.iter().any(|index| index.handle.label() == label))
    }

    /// Detaches the index with `label` from `graph` and closes it. Returns whether an index was
    /// found.
    pub fn unregister(&self, graph: &Graph, label: &str) -> IndexResult<bool> {
        let key = GraphKey::of(graph);
        let removed = {
            let mut indexes = self.indexes.write();
            let Some(registered) = indexes.get_mut(&key) else {
                return Ok(false);
            };
            let Some(position) = registered
                .iter()
                .position(|index| index.handle.label() == label)
            else {
                return Ok(false);
            };
            let removed = registered.remove(position);
            if registered.is_empty() {
                indexes.remove(&key);
            }
            removed
        };
        graph.write().remove_listener(removed.listener);
        removed.handle.close()?;
        Ok(true)
    }

    /// Detaches and closes all indexes of `graph` and returns them, e.g., to delete them.
    pub fn unregister_all(&self, graph: &Graph) -> IndexResult<Vec<Arc<dyn IndexHandle>>> {
        let Some(registered) = self.indexes.write().remove(&GraphKey::of(graph)) else {
            return Ok(Vec::new());
        };
        {
            let mut guard = graph.write();
            for index in &registered {
                guard.remove_listener(index.listener);
            }
        }
        let mut handles = Vec::with_capacity(registered.len());
        for index in registered {
            index.handle.close()?;
            handles.push(index.handle);
        }
        Ok(handles)
    }

    pub fn get_indexes(&self, graph: &Graph) -> Vec<Arc<dyn IndexHandle>> {
        self.indexes
            .read()
            .get(&GraphKey::of(graph))
            .map(|registered| {
                registered
                    .iter()
                    .map(|index| Arc::clone(&index.handle))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_indexes(&self, graph: &Graph) -> bool {
        self.indexes.read().contains_key(&GraphKey::of(graph))
    }

    /// The number of graphs with at least one index.
    pub fn size(&self) -> usize {
        self.indexes.read().len()
    }

    /// Collects the hooks of the indexes of `graph` for one query.
    pub fn index_set(&self, graph: &Graph) -> IndexSet {
        IndexSet::new(self.get_indexes(graph))
    }

    /// Flushes all indexes. Every index is attempted; the first error is returned.
    pub fn flush_all(&self) -> IndexResult<()> {
        let mut result = Ok(());
        for index in self.indexes.read().values().flatten() {
            if let Err(error) = index.handle.flush() {
                tracing::error!(index = index.handle.label(), error = %error, "Could not flush index");
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }
        result
    }

    /// Closes all indexes and forgets them. Listeners stay attached to their graphs; closed
    /// indexes ignore further notifications.
    pub fn close_all(&self) -> IndexResult<()> {
        let indexes = std::mem::take(&mut *self.indexes.write());
        let mut result = Ok(());
        for index in indexes.into_values().flatten() {
            if let Err(error) = index.handle.close() {
                tracing::error!(index = index.handle.label(), error = %error, "Could not close index");
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }
        result
    }
}

impl fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indexes = self.indexes.read();
        let mut map = f.debug_map();
        for (key, registered) in indexes.iter() {
            map.entry(
                &key.to_string(),
                &registered
                    .iter()
                    .map(|index| index.handle.label())
                    .collect::<Vec<_>>(),
            );
        }
        map.finish()
    }
}
