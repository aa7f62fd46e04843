use dashmap::DashMap;
use parking_lot::Mutex;
use parliament_common::error::QueryEvaluationError;
use parliament_common::CancellationFlag;
use rustc_hash::FxHasher;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;

/// The lifecycle of a tracked query.
///
/// `Finished`, `Cancelled` and `Error` are terminal. Once a query reached one of them, its state
/// never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryState {
    Created,
    Running,
    Finished,
    Cancelled,
    Error,
}

impl QueryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::Error)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        })
    }
}

/// A query known to a [QueryTracker].
pub struct QueryHandle {
    id: u64,
    display: String,
    created_at: OffsetDateTime,
    state: Mutex<QueryState>,
    cancellation: CancellationFlag,
}

impl QueryHandle {
    fn new(id: u64, display: String) -> Self {
        Self {
            id,
            display,
            created_at: OffsetDateTime::now_utc(),
            state: Mutex::new(QueryState::Created),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// A description of the query, e.g., its algebra.
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn state(&self) -> QueryState {
        *self.state.lock()
    }

    /// The flag polled by the operators evaluating this query.
    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    /// Marks the query as running. Returns false if it was not in the `Created` state.
    pub fn start(&self) -> bool {
        self.transition(|state| state == QueryState::Created, QueryState::Running)
    }

    /// Marks the query as finished unless it already ended, e.g., because it was cancelled after
    /// its last solution was computed. Returns the state the query ended in.
    pub fn finish(&self) -> QueryState {
        let mut state = self.state.lock();
        if !state.is_terminal() {
            tracing::debug!(query = self.id, from = %*state, to = %QueryState::Finished, "Query state changed");
            *state = QueryState::Finished;
        }
        *state
    }

    /// Records that the query failed. A cancelled query stays cancelled.
    pub fn fail(&self, error: &QueryEvaluationError) -> bool {
        let changed = self.transition(|state| !state.is_terminal(), QueryState::Error);
        if changed {
            tracing::debug!(query = self.id, error = %error, "Query failed");
        }
        changed
    }

    /// Requests the cancellation of the query.
    ///
    /// Cancellation is cooperative: the operators of the query observe the request the next time
    /// they poll the flag. Returns false if the query already reached a terminal state.
    pub fn cancel(&self) -> bool {
        let changed = self.transition(|state| !state.is_terminal(), QueryState::Cancelled);
        if changed {
            self.cancellation.cancel();
        }
        changed
    }

    fn transition(&self, allowed: impl FnOnce(QueryState) -> bool, to: QueryState) -> bool {
        let mut state = self.state.lock();
        if !allowed(*state) {
            return false;
        }
        tracing::debug!(query = self.id, from = %*state, to = %to, "Query state changed");
        *state = to;
        true
    }
}

impl fmt::Debug for QueryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Keeps track of the queries in flight and allows cancelling them by id.
#[derive(Debug, Default)]
pub struct QueryTracker {
    next_id: AtomicU64,
    handles: DashMap<u64, Arc<QueryHandle>, BuildHasherDefault<FxHasher>>,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a handle for a new query.
    pub fn create(&self, display: impl Into<String>) -> Arc<QueryHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = Arc::new(QueryHandle::new(id, display.into()));
        self.handles.insert(id, Arc::clone(&handle));
        handle
    }

    pub fn get(&self, id: u64) -> Option<Arc<QueryHandle>> {
        self.handles.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Cancels the query with `id`. Returns false if there is no such query or it already ended.
    pub fn cancel(&self, id: u64) -> bool {
        self.get(id).is_some_and(|handle| handle.cancel())
    }

    pub fn cancel_all(&self) {
        for entry in &self.handles {
            entry.value().cancel();
        }
    }

    /// Forgets the query with `id`.
    pub fn remove(&self, id: u64) -> Option<Arc<QueryHandle>> {
        self.handles.remove(&id).map(|(_, handle)| handle)
    }

    /// The ids of the tracked queries in ascending order.
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.handles.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
