use crate::lifecycle::{IndexLifecycle, IndexState};
use crate::persistence::{RecordFile, ValueCodec};
use crate::record::Record;
use parking_lot::RwLock;
use parliament_common::error::{IndexError, IndexStateError};
use parliament_common::IndexResult;
use parliament_model::Term;
use std::fmt::Debug;

/// The in-memory records of an index together with the access paths the index needs.
///
/// Keys are unique. Inserting a record for a present key replaces its value.
pub trait RecordStore: Default + Send + Sync + 'static {
    type Value: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Adds or replaces the record with the key of `record`. Returns whether a change occurred.
    fn insert(&mut self, record: Record<Self::Value>) -> bool;

    /// Removes `record` if its key currently has its value. Returns whether a change occurred.
    fn remove(&mut self, record: &Record<Self::Value>) -> bool;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, key: &Term) -> Option<&Self::Value>;

    fn records(&self) -> Vec<Record<Self::Value>>;
}

struct CoreState<S> {
    lifecycle: IndexLifecycle,
    content: S,
    /// The number of triples with an indexed predicate the graph holds.
    triples: usize,
    dirty: bool,
}

impl<S: RecordStore> CoreState<S> {
    fn has_same_records(&self, other: &S) -> bool {
        self.content.len() == other.len()
            && other
                .records()
                .iter()
                .all(|record| self.content.get(&record.key) == Some(&record.value))
    }
}

/// The lifecycle, persistence and triple accounting shared by all record based indexes.
///
/// An index built on an [IndexCore] only provides its [RecordStore] and the codec for its values.
/// The core keeps the content behind one lock, loads it from its [RecordFile] on open and writes it
/// back on flush and close if it changed.
///
/// The core also counts the triples with an indexed predicate of its graph. Every record stems from
/// one such triple and no two records stem from the same triple, so the index represents the graph
/// exactly if both numbers are equal. This is not the case if a triple does not describe a value
/// the index understands or if a key has more than one value in the graph.
pub struct IndexCore<S, C> {
    label: String,
    codec: C,
    file: Option<RecordFile>,
    state: RwLock<CoreState<S>>,
}

impl<S: RecordStore, C: ValueCodec<S::Value> + Send + Sync> IndexCore<S, C> {
    pub fn new(label: impl Into<String>, codec: C, file: Option<RecordFile>) -> Self {
        let label = label.into();
        Self {
            state: RwLock::new(CoreState {
                lifecycle: IndexLifecycle::new(label.clone()),
                content: S::default(),
                triples: 0,
                dirty: false,
            }),
            label,
            codec,
            file,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> IndexState {
        self.state.read().lifecycle.state()
    }

    pub fn open(&self) -> IndexResult<()> {
        let mut state = self.state.write();
        if !state.lifecycle.open()? {
            return Ok(());
        }
        if let Some(file) = &self.file {
            let records = file.load(&self.codec).map_err(|error| IndexError::Open {
                label: self.label.clone(),
                source: Box::new(error),
            })?;
            for record in records {
                state.content.insert(record);
            }
            tracing::debug!(index = %self.label, records = state.content.len(), "Loaded index");
        }
        Ok(())
    }

    /// Closes the index, persisting its content if it is open.
    pub fn close(&self) -> IndexResult<()> {
        let mut state = self.state.write();
        if state.lifecycle.is_open() {
            self.store(&mut state)?;
        }
        state.lifecycle.close();
        Ok(())
    }

    pub fn clear(&self) -> IndexResult<()> {
        let mut state = self.state.write();
        state.lifecycle.ensure_open()?;
        state.dirty |= !state.content.is_empty();
        state.content.clear();
        state.triples = 0;
        Ok(())
    }

    /// Forgets the content and removes the persisted file.
    pub fn delete(&self) -> IndexResult<()> {
        let mut state = self.state.write();
        state.content.clear();
        state.triples = 0;
        state.dirty = false;
        if let Some(file) = &self.file {
            file.delete()
                .map_err(|error| IndexError::storage(&self.label, error))?;
        }
        Ok(())
    }

    pub fn flush(&self) -> IndexResult<()> {
        let mut state = self.state.write();
        state.lifecycle.ensure_open()?;
        self.store(&mut state)
    }

    pub fn add(&self, record: Record<S::Value>) -> IndexResult<bool> {
        let mut state = self.state.write();
        state.lifecycle.ensure_open()?;
        let changed = state.content.insert(record);
        state.dirty |= changed;
        Ok(changed)
    }

    pub fn remove(&self, record: &Record<S::Value>) -> IndexResult<bool> {
        let mut state = self.state.write();
        state.lifecycle.ensure_open()?;
        let changed = state.content.remove(record);
        state.dirty |= changed;
        Ok(changed)
    }

    /// Counts a triple with an indexed predicate that was added to or removed from the graph.
    pub fn count_triple(&self, added: bool) -> IndexResult<()> {
        let mut state = self.state.write();
        state.lifecycle.ensure_open()?;
        state.triples = if added {
            state.triples.saturating_add(1)
        } else {
            state.triples.saturating_sub(1)
        };
        Ok(())
    }

    /// Replaces the content with `records`, derived from the `triples` triples with an indexed
    /// predicate of the graph. Loaded content that already equals `records` is kept as it is.
    ///
    /// Returns whether the content changed.
    pub fn rebuild(&self, records: Vec<Record<S::Value>>, triples: usize) -> IndexResult<bool> {
        let mut content = S::default();
        for record in records {
            content.insert(record);
        }
        let mut state = self.state.write();
        state.lifecycle.ensure_open()?;
        state.triples = triples;
        if state.has_same_records(&content) {
            return Ok(false);
        }
        state.content = content;
        state.dirty = true;
        Ok(true)
    }

    /// Returns whether every triple with an indexed predicate is represented by a record.
    pub fn is_exact(&self) -> bool {
        let state = self.state.read();
        state.lifecycle.is_open() && state.triples == state.content.len()
    }

    pub fn ensure_open(&self) -> Result<(), IndexStateError> {
        self.state.read().lifecycle.ensure_open()
    }

    /// Runs `f` on the content. Fails unless the index is open.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R, IndexStateError> {
        let state = self.state.read();
        state.lifecycle.ensure_open()?;
        Ok(f(&state.content))
    }

    /// Runs `f` on the content if the index is open.
    pub fn read_if_open<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        let state = self.state.read();
        state.lifecycle.is_open().then(|| f(&state.content))
    }

    pub fn find(&self, key: &Term) -> Result<Option<Record<S::Value>>, IndexStateError> {
        self.read(|content| {
            content
                .get(key)
                .map(|value| Record::new(key.clone(), value.clone()))
        })
    }

    pub fn size(&self) -> Result<usize, IndexStateError> {
        self.read(S::len)
    }

    pub fn records(&self) -> Result<Vec<Record<S::Value>>, IndexStateError> {
        self.read(S::records)
    }

    fn store(&self, state: &mut CoreState<S>) -> IndexResult<()> {
        let Some(file) = &self.file else {
            state.dirty = false;
            return Ok(());
        };
        if !state.dirty {
            return Ok(());
        }
        let records = state.content.records();
        file.store(&records, &self.codec)
            .map_err(|error| IndexError::storage(&self.label, error))?;
        state.dirty = false;
        tracing::debug!(index = %self.label, records = records.len(), "Stored index");
        Ok(())
    }
}
