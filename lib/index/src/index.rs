use crate::query::{IndexPatternQuerier, IndexPropertyFunction, RangeSource};
use crate::record::Record;
use crate::IndexState;
use parliament_common::IndexResult;
use parliament_model::{NamedNode, Term, Triple};
use std::fmt::Debug;
use std::sync::Arc;

/// A lazily evaluated sequence of records. Calling the producing method again restarts it.
pub type RecordIter<V> = Box<dyn Iterator<Item = Record<V>> + Send>;

/// Derives records from triples.
///
/// An index is only notified of triples whose predicate is one of [Self::predicates]. The match
/// is a simple equality test.
pub trait RecordFactory: Send + Sync {
    type Value;

    /// The predicates of the triples this factory creates records for.
    fn predicates(&self) -> &[NamedNode];

    /// Creates the record for `triple`. Returns [None] if the triple does not describe a value this
    /// index understands (e.g., a malformed literal).
    fn create_record(&self, triple: &Triple) -> Option<Record<Self::Value>>;

    fn matches(&self, triple: &Triple) -> bool {
        self.predicates().contains(&triple.predicate)
    }
}

/// A secondary index over the records of one graph.
///
/// All methods take `&self`. Implementations use interior mutability, as an index is shared between
/// the [IndexManager](crate::IndexManager), the graph listener and running queries. Calling a
/// mutator on an index that is not open fails with an
/// [IndexStateError](parliament_common::error::IndexStateError).
pub trait Index: Send + Sync {
    type Value: Clone + Debug + Send + Sync + 'static;
    type Factory: RecordFactory<Value = Self::Value>;

    /// A human-readable name of the index that is used in errors and logs.
    fn label(&self) -> &str;

    fn state(&self) -> IndexState;

    fn is_closed(&self) -> bool {
        self.state() == IndexState::Closed
    }

    fn open(&self) -> IndexResult<()>;

    /// Closes the index, persisting its content if it has a persistent store.
    fn close(&self) -> IndexResult<()>;

    fn clear(&self) -> IndexResult<()>;

    /// Removes the persisted state of the index.
    fn delete(&self) -> IndexResult<()>;

    /// Persists pending changes.
    fn flush(&self) -> IndexResult<()>;

    /// Adds or replaces the record with the key of `record`. Returns whether a change occurred.
    fn add(&self, record: Record<Self::Value>) -> IndexResult<bool>;

    /// Removes the record with the key of `record`. Returns whether a change occurred.
    fn remove(&self, record: &Record<Self::Value>) -> IndexResult<bool>;

    fn find(&self, key: &Term) -> IndexResult<Option<Record<Self::Value>>>;

    /// Counts a triple with an indexed predicate that was added to or removed from the graph,
    /// whether or not it produced a record.
    fn count_triple(&self, added: bool) -> IndexResult<()>;

    /// Replaces the content with `records`, derived from all `triples` triples with an indexed
    /// predicate of the graph. Returns whether the content changed.
    fn rebuild(&self, records: Vec<Record<Self::Value>>, triples: usize) -> IndexResult<bool>;

    /// Returns whether the index is open and represents each triple with an indexed predicate by
    /// exactly one record. Only exact indexes answer queries.
    fn is_exact(&self) -> bool;

    /// Returns the number of records. Fails if the index cannot report its size cheaply.
    fn size(&self) -> IndexResult<usize>;

    fn iter(&self) -> IndexResult<RecordIter<Self::Value>>;

    fn record_factory(&self) -> &Self::Factory;

    /// Returns the querier that answers triple patterns from this index.
    fn pattern_querier(&self) -> Option<Arc<dyn IndexPatternQuerier>> {
        None
    }

    /// Returns the property functions that are backed by this index.
    fn property_functions(&self) -> Vec<Arc<dyn IndexPropertyFunction>> {
        Vec::new()
    }

    /// Returns the source for range filters that are backed by this index.
    fn range_source(&self) -> Option<Arc<dyn RangeSource>> {
        None
    }
}

/// An index whose values are ordered by a key and that supports range scans.
pub trait RangeIndex: Index {
    /// The part of a value the records are ordered by.
    type Key;

    /// Returns the records with `start <= key <= end`. An omitted bound is unbounded.
    fn iter_range(
        &self,
        start: Option<&Self::Key>,
        end: Option<&Self::Key>,
    ) -> IndexResult<RecordIter<Self::Value>>;
}

/// A binary predicate over index values, e.g., one of Allen's interval relations.
pub trait Relation<V>: Copy + Send + Sync + 'static {
    fn relate(&self, a: &V, b: &V) -> bool;
}

/// An index that can find the records standing in a relation to a given value.
pub trait RelationIndex: Index {
    type Relation: Relation<Self::Value>;

    /// Returns the records `r` for which `relation.relate(r.value, value)` holds.
    fn iter_related(
        &self,
        value: &Self::Value,
        relation: Self::Relation,
    ) -> IndexResult<RecordIter<Self::Value>>;

    fn estimate_related(&self, value: &Self::Value, relation: Self::Relation) -> IndexResult<u64> {
        Ok(self.iter_related(value, relation)?.count() as u64)
    }
}

/// The binding protocol of a relation index that drives a binary property function `?x REL ?y`.
///
/// Most relations are not symmetric. Which argument is bound decides which range scan is used.
pub trait RelationalBinding: Send + Sync {
    type Value;

    /// Given the value of the second argument, returns all matches for the first argument.
    fn bind_first_var(&self, bound: &Self::Value) -> IndexResult<RecordIter<Self::Value>>;

    /// Given the value of the first argument, returns all matches for the second argument.
    fn bind_second_var(&self, bound: &Self::Value) -> IndexResult<RecordIter<Self::Value>>;

    /// Exact number of results of [Self::bind_first_var].
    fn estimate_first_var(&self, bound: &Self::Value) -> IndexResult<u64> {
        Ok(self.bind_first_var(bound)?.count() as u64)
    }

    /// Exact number of results of [Self::bind_second_var].
    fn estimate_second_var(&self, bound: &Self::Value) -> IndexResult<u64> {
        Ok(self.bind_second_var(bound)?.count() as u64)
    }
}
