use crate::table::TripleTable;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use parliament_common::error::IndexError;
use parliament_common::{GraphCapabilities, TripleMatch, TriplePosition, TripleSource};
use parliament_model::{NamedNode, Term, Triple};
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies a graph instance for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u64);

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Identifies a registered [GraphListener] of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A callback that is invoked for every mutation of a graph.
///
/// The callbacks run while the graph's write lock is held. If a listener fails, the mutation is
/// undone in the graph and in the listeners notified before, and the error is returned to the
/// caller of the mutation.
pub trait GraphListener: Send + Sync {
    fn triple_added(&self, triple: &Triple) -> Result<(), IndexError>;

    fn triple_removed(&self, triple: &Triple) -> Result<(), IndexError>;

    fn graph_cleared(&self) -> Result<(), IndexError>;
}

struct GraphContent {
    table: TripleTable,
    listeners: Vec<(ListenerId, Arc<dyn GraphListener>)>,
    next_listener: u64,
}

impl GraphContent {
    /// Calls `notify` for every listener in order. If a listener fails, `undo` is called for the
    /// listeners notified before it, latest first, and the error is returned.
    fn notify(
        &self,
        notify: impl Fn(&dyn GraphListener) -> Result<(), IndexError>,
        undo: impl Fn(&dyn GraphListener) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        for (position, (_, listener)) in self.listeners.iter().enumerate() {
            let Err(error) = notify(listener.as_ref()) else {
                continue;
            };
            for (id, notified) in self.listeners[..position].iter().rev() {
                if let Err(undo_error) = undo(notified.as_ref()) {
                    tracing::error!(listener = id.0, error = %undo_error, "Could not undo a graph notification");
                }
            }
            return Err(error);
        }
        Ok(())
    }
}

/// A graph of triples guarded by a single reader/writer lock.
///
/// The lock is fair. Multiple queries may hold a read lock at the same time, while a writer waits
/// until all of them have released it.
pub struct Graph {
    id: GraphId,
    name: Option<NamedNode>,
    capabilities: GraphCapabilities,
    content: RwLock<GraphContent>,
}

impl Graph {
    /// Creates the default graph of a store.
    pub fn new() -> Self {
        Self::create(None)
    }

    /// Creates a named graph.
    pub fn named(name: NamedNode) -> Self {
        Self::create(Some(name))
    }

    fn create(name: Option<NamedNode>) -> Self {
        let table = TripleTable::new();
        Self {
            id: GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed)),
            name,
            capabilities: table.capabilities(),
            content: RwLock::new(GraphContent {
                table,
                listeners: Vec::new(),
                next_listener: 0,
            }),
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    /// The name of the graph or [None] for the default graph.
    pub fn name(&self) -> Option<&NamedNode> {
        self.name.as_ref()
    }

    pub fn capabilities(&self) -> GraphCapabilities {
        self.capabilities
    }

    /// Acquires the read lock. It is released when the guard is dropped.
    pub fn read(&self) -> GraphReadGuard<'_> {
        GraphReadGuard(self.content.read())
    }

    /// Acquires the write lock. It is released when the guard is dropped.
    pub fn write(&self) -> GraphWriteGuard<'_> {
        GraphWriteGuard(self.content.write())
    }

    /// Inserts `triple` and notifies all listeners.
    pub fn insert(&self, triple: Triple) -> Result<bool, IndexError> {
        self.write().insert(triple)
    }

    /// Removes `triple` and notifies all listeners.
    pub fn remove(&self, triple: &Triple) -> Result<bool, IndexError> {
        self.write().remove(triple)
    }

    pub fn clear(&self) -> Result<(), IndexError> {
        self.write().clear()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Shared access to the triples of a [Graph].
pub struct GraphReadGuard<'a>(RwLockReadGuard<'a, GraphContent>);

impl Deref for GraphReadGuard<'_> {
    type Target = TripleTable;

    fn deref(&self) -> &Self::Target {
        &self.0.table
    }
}

/// Exclusive access to a [Graph]. All mutations notify the listeners before returning.
///
/// A mutation either reaches the graph and all listeners or, if a listener fails, none of them.
pub struct GraphWriteGuard<'a>(RwLockWriteGuard<'a, GraphContent>);

impl GraphWriteGuard<'_> {
    pub fn insert(&mut self, triple: Triple) -> Result<bool, IndexError> {
        if !self.0.table.insert(triple.clone()) {
            return Ok(false);
        }
        let notified = self.0.notify(
            |listener| listener.triple_added(&triple),
            |listener| listener.triple_removed(&triple),
        );
        if let Err(error) = notified {
            self.0.table.remove(&triple);
            return Err(error);
        }
        Ok(true)
    }

    pub fn remove(&mut self, triple: &Triple) -> Result<bool, IndexError> {
        if !self.0.table.remove(triple) {
            return Ok(false);
        }
        let notified = self.0.notify(
            |listener| listener.triple_removed(triple),
            |listener| listener.triple_added(triple),
        );
        if let Err(error) = notified {
            self.0.table.insert(triple.clone());
            return Err(error);
        }
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), IndexError> {
        let table = std::mem::replace(&mut self.0.table, TripleTable::new());
        let notified = self.0.notify(
            |listener| listener.graph_cleared(),
            |listener| {
                table
                    .iter()
                    .try_for_each(|triple| listener.triple_added(triple))
            },
        );
        if let Err(error) = notified {
            self.0.table = table;
            return Err(error);
        }
        Ok(())
    }

    /// Registers a listener. It is notified of every later mutation.
    pub fn add_listener(&mut self, listener: Arc<dyn GraphListener>) -> ListenerId {
        let id = ListenerId(self.0.next_listener);
        self.0.next_listener += 1;
        self.0.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.0.listeners.len();
        self.0.listeners.retain(|(listener_id, _)| *listener_id != id);
        before != self.0.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.0.listeners.len()
    }
}

impl Deref for GraphWriteGuard<'_> {
    type Target = TripleTable;

    fn deref(&self) -> &Self::Target {
        &self.0.table
    }
}

impl TripleSource for GraphReadGuard<'_> {
    fn find(&self, pattern: &TripleMatch) -> Box<dyn Iterator<Item = Triple> + '_> {
        self.0.table.find(pattern)
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.0.table.contains(triple)
    }

    fn count_in_position(&self, node: &Term, position: TriplePosition) -> i64 {
        self.0.table.count_in_position(node, position)
    }

    fn len(&self) -> usize {
        self.0.table.len()
    }

    fn capabilities(&self) -> GraphCapabilities {
        self.0.table.capabilities()
    }
}
