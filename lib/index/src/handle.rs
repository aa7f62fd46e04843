use crate::index::{Index, RecordFactory};
use crate::query::{IndexPatternQuerier, IndexPropertyFunction, RangeSource};
use crate::IndexState;
use parliament_common::error::IndexError;
use parliament_common::IndexResult;
use parliament_model::Triple;
use parliament_storage::GraphListener;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased [Index] as it is stored by the [IndexManager](crate::IndexManager).
///
/// Every [Index] is an [IndexHandle]. Mutations arrive as triples and are turned into records by
/// the record factory of the index.
pub trait IndexHandle: Send + Sync {
    fn label(&self) -> &str;

    fn state(&self) -> IndexState;

    fn open(&self) -> IndexResult<()>;

    fn close(&self) -> IndexResult<()>;

    fn clear(&self) -> IndexResult<()>;

    fn delete(&self) -> IndexResult<()>;

    fn flush(&self) -> IndexResult<()>;

    fn size(&self) -> IndexResult<usize>;

    fn is_exact(&self) -> bool;

    /// Returns whether the index is interested in `triple`.
    fn matches(&self, triple: &Triple) -> bool;

    fn triple_added(&self, triple: &Triple) -> IndexResult<bool>;

    fn triple_removed(&self, triple: &Triple) -> IndexResult<bool>;

    /// Rebuilds the index from all triples of its graph, e.g., when it is attached to the graph.
    /// Returns the number of records.
    fn index_triples(&self, triples: &mut dyn Iterator<Item = Triple>) -> IndexResult<usize>;

    fn pattern_querier(&self) -> Option<Arc<dyn IndexPatternQuerier>>;

    fn property_functions(&self) -> Vec<Arc<dyn IndexPropertyFunction>>;

    fn range_source(&self) -> Option<Arc<dyn RangeSource>>;

    fn as_any(&self) -> &dyn Any;
}

impl<I: Index + 'static> IndexHandle for I {
    fn label(&self) -> &str {
        Index::label(self)
    }

    fn state(&self) -> IndexState {
        Index::state(self)
    }

    fn open(&self) -> IndexResult<()> {
        Index::open(self)
    }

    fn close(&self) -> IndexResult<()> {
        Index::close(self)
    }

    fn clear(&self) -> IndexResult<()> {
        Index::clear(self)
    }

    fn delete(&self) -> IndexResult<()> {
        Index::delete(self)
    }

    fn flush(&self) -> IndexResult<()> {
        Index::flush(self)
    }

    fn size(&self) -> IndexResult<usize> {
        Index::size(self)
    }

    fn is_exact(&self) -> bool {
        Index::is_exact(self)
    }

    fn matches(&self, triple: &Triple) -> bool {
        self.record_factory().matches(triple)
    }

    fn triple_added(&self, triple: &Triple) -> IndexResult<bool> {
        if !IndexHandle::matches(self, triple) {
            return Ok(false);
        }
        self.count_triple(true)?;
        match self.record_factory().create_record(triple) {
            Some(record) => self.add(record),
            None => Ok(false),
        }
    }

    fn triple_removed(&self, triple: &Triple) -> IndexResult<bool> {
        if !IndexHandle::matches(self, triple) {
            return Ok(false);
        }
        self.count_triple(false)?;
        match self.record_factory().create_record(triple) {
            Some(record) => self.remove(&record),
            None => Ok(false),
        }
    }

    fn index_triples(&self, triples: &mut dyn Iterator<Item = Triple>) -> IndexResult<usize> {
        let factory = self.record_factory();
        let mut count = 0;
        let mut records = Vec::new();
        for triple in triples.filter(|triple| factory.matches(triple)) {
            count += 1;
            records.extend(factory.create_record(&triple));
        }
        self.rebuild(records, count)?;
        Index::size(self)
    }

    fn pattern_querier(&self) -> Option<Arc<dyn IndexPatternQuerier>> {
        Index::pattern_querier(self)
    }

    fn property_functions(&self) -> Vec<Arc<dyn IndexPropertyFunction>> {
        Index::property_functions(self)
    }

    fn range_source(&self) -> Option<Arc<dyn RangeSource>> {
        Index::range_source(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for dyn IndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexHandle")
            .field("label", &self.label())
            .field("state", &self.state())
            .finish()
    }
}

/// Forwards the mutations of a graph to one index. Indexes that are not open are skipped.
pub(crate) struct IndexListener(pub(crate) Arc<dyn IndexHandle>);

impl IndexListener {
    fn is_active(&self) -> bool {
        self.0.state() == IndexState::Open
    }
}

impl GraphListener for IndexListener {
    fn triple_added(&self, triple: &Triple) -> Result<(), IndexError> {
        if !self.is_active() {
            return Ok(());
        }
        self.0.triple_added(triple).map(|_| ())
    }

    fn triple_removed(&self, triple: &Triple) -> Result<(), IndexError> {
        if !self.is_active() {
            return Ok(());
        }
        self.0.triple_removed(triple).map(|_| ())
    }

    fn graph_cleared(&self) -> Result<(), IndexError> {
        if !self.is_active() {
            return Ok(());
        }
        self.0.clear()
    }
}
