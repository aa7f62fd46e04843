use parliament_common::error::IndexStateError;

/// The lifecycle state of an index.
///
/// An index starts in [IndexState::Created], is opened once and closed once. A closed index is
/// never reopened; a new index must be created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexState {
    Created,
    Open,
    Closed,
}

/// Tracks the lifecycle state of an index and validates transitions.
#[derive(Debug, Clone)]
pub struct IndexLifecycle {
    label: String,
    state: IndexState,
}

impl IndexLifecycle {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: IndexState::Created,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == IndexState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state == IndexState::Closed
    }

    /// Opens the index. Returns false if it was already open.
    pub fn open(&mut self) -> Result<bool, IndexStateError> {
        match self.state {
            IndexState::Created => {
                self.state = IndexState::Open;
                Ok(true)
            }
            IndexState::Open => Ok(false),
            IndexState::Closed => Err(IndexStateError::Reopen(self.label.clone())),
        }
    }

    /// Closes the index. Returns false if it was already closed.
    pub fn close(&mut self) -> bool {
        let changed = self.state != IndexState::Closed;
        self.state = IndexState::Closed;
        changed
    }

    /// Fails unless the index is open.
    pub fn ensure_open(&self) -> Result<(), IndexStateError> {
        match self.state {
            IndexState::Open => Ok(()),
            IndexState::Created => Err(IndexStateError::NotOpen(self.label.clone())),
            IndexState::Closed => Err(IndexStateError::Closed(self.label.clone())),
        }
    }
}
