use crate::extent::{ExtentCodec, TemporalExtent};
use crate::function::TemporalPropertyFunction;
use crate::record_factory::TemporalRecordFactory;
use crate::relation::TemporalRelation;
use crate::scan::{Decider, InstantKey, ScanIter};
use parliament_common::error::IndexStateError;
use parliament_common::{CancellationFlag, IndexResult};
use parliament_index::{
    Index, IndexCore, IndexPropertyFunction, IndexState, Record, RecordFile, RecordIter,
    RecordStore, RelationIndex, RelationalBinding,
};
use parliament_model::Term;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The extents of a [TemporalIndex] by node and by extent, and all their instants in order.
#[derive(Default)]
pub(crate) struct TemporalContent {
    extents: FxHashMap<Term, TemporalExtent>,
    pub(crate) nodes: FxHashMap<TemporalExtent, Vec<Term>>,
    pub(crate) instants: BTreeSet<InstantKey>,
}

impl TemporalContent {
    fn unlink(&mut self, key: &Term, extent: TemporalExtent) {
        let Some(nodes) = self.nodes.get_mut(&extent) else {
            return;
        };
        nodes.retain(|node| node != key);
        if nodes.is_empty() {
            self.nodes.remove(&extent);
            for instant in InstantKey::of(extent) {
                self.instants.remove(&instant);
            }
        }
    }
}

impl RecordStore for TemporalContent {
    type Value = TemporalExtent;

    fn insert(&mut self, record: Record<TemporalExtent>) -> bool {
        let Record { key, value: extent } = record;
        if let Some(previous) = self.extents.get(&key).copied() {
            if previous == extent {
                return false;
            }
            self.unlink(&key, previous);
        }
        let nodes = self.nodes.entry(extent).or_default();
        if nodes.is_empty() {
            self.instants.extend(InstantKey::of(extent));
        }
        nodes.push(key.clone());
        self.extents.insert(key, extent);
        true
    }

    fn remove(&mut self, record: &Record<TemporalExtent>) -> bool {
        if self.extents.get(&record.key) != Some(&record.value) {
            return false;
        }
        self.extents.remove(&record.key);
        self.unlink(&record.key, record.value);
        true
    }

    fn clear(&mut self) {
        self.extents.clear();
        self.nodes.clear();
        self.instants.clear();
    }

    fn len(&self) -> usize {
        self.extents.len()
    }

    fn get(&self, key: &Term) -> Option<&TemporalExtent> {
        self.extents.get(key)
    }

    fn records(&self) -> Vec<Record<TemporalExtent>> {
        self.extents
            .iter()
            .map(|(key, extent)| Record::new(key.clone(), *extent))
            .collect()
    }
}

/// The shared part of a [TemporalIndex] that is also used by its property functions.
pub(crate) struct TemporalInner {
    pub(crate) core: IndexCore<TemporalContent, ExtentCodec>,
}

impl TemporalInner {
    pub(crate) fn label(&self) -> &str {
        self.core.label()
    }

    pub(crate) fn find(&self, key: &Term) -> Result<Option<TemporalExtent>, IndexStateError> {
        self.core.read(|content| content.get(key).copied())
    }

    pub(crate) fn size(&self) -> Result<usize, IndexStateError> {
        self.core.size()
    }

    pub(crate) fn records(&self) -> Result<Vec<Record<TemporalExtent>>, IndexStateError> {
        self.core.records()
    }

    /// Returns the records `x` with `x relation bound`.
    pub(crate) fn bind_first_var(
        self: &Arc<Self>,
        relation: TemporalRelation,
        bound: &TemporalExtent,
        cancellation: Option<CancellationFlag>,
    ) -> Result<RecordIter<TemporalExtent>, IndexStateError> {
        self.core.ensure_open()?;
        let Some(scan) = relation.first_scan(bound) else {
            return Ok(Box::new(std::iter::empty()));
        };
        let decider = Decider {
            relation,
            bound: *bound,
            candidate_is_first: true,
        };
        Ok(Box::new(ScanIter::new(
            Arc::clone(self),
            scan,
            decider,
            cancellation,
        )))
    }

    /// Returns the records `y` with `bound relation y`.
    pub(crate) fn bind_second_var(
        self: &Arc<Self>,
        relation: TemporalRelation,
        bound: &TemporalExtent,
        cancellation: Option<CancellationFlag>,
    ) -> Result<RecordIter<TemporalExtent>, IndexStateError> {
        self.core.ensure_open()?;
        let Some(scan) = relation.second_scan(bound) else {
            return Ok(Box::new(std::iter::empty()));
        };
        let decider = Decider {
            relation,
            bound: *bound,
            candidate_is_first: false,
        };
        Ok(Box::new(ScanIter::new(
            Arc::clone(self),
            scan,
            decider,
            cancellation,
        )))
    }
}

/// An index of the instants and intervals attached to the nodes of a graph.
///
/// Besides a map from node to extent, the index keeps every instant, interval start and interval
/// end in one ordered set. The relations of [TemporalRelation] are answered by a range scan over
/// this set followed by the exact test of the relation on each candidate.
///
/// A node has a single extent. The index is inexact while a node has more than one extent in the
/// graph.
pub struct TemporalIndex {
    inner: Arc<TemporalInner>,
    record_factory: TemporalRecordFactory,
}

impl TemporalIndex {
    /// Creates an in-memory index.
    pub fn new() -> Self {
        Self::create(None)
    }

    /// Creates an index that loads its content from `file` when it is opened and writes it back on
    /// [Index::flush] and [Index::close].
    pub fn persistent(file: RecordFile) -> Self {
        Self::create(Some(file))
    }

    fn create(file: Option<RecordFile>) -> Self {
        Self {
            inner: Arc::new(TemporalInner {
                core: IndexCore::new("temporal index", ExtentCodec, file),
            }),
            record_factory: TemporalRecordFactory::new(),
        }
    }

    /// Returns the property function implementing `relation` over this index.
    pub fn property_function(&self, relation: TemporalRelation) -> TemporalPropertyFunction {
        TemporalPropertyFunction::new(relation, Arc::clone(&self.inner))
    }
}

impl Default for TemporalIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Index for TemporalIndex {
    type Value = TemporalExtent;
    type Factory = TemporalRecordFactory;

    fn label(&self) -> &str {
        self.inner.label()
    }

    fn state(&self) -> IndexState {
        self.inner.core.state()
    }

    fn open(&self) -> IndexResult<()> {
        self.inner.core.open()
    }

    fn close(&self) -> IndexResult<()> {
        self.inner.core.close()
    }

    fn clear(&self) -> IndexResult<()> {
        self.inner.core.clear()
    }

    fn delete(&self) -> IndexResult<()> {
        self.inner.core.delete()
    }

    fn flush(&self) -> IndexResult<()> {
        self.inner.core.flush()
    }

    fn add(&self, record: Record<TemporalExtent>) -> IndexResult<bool> {
        self.inner.core.add(record)
    }

    fn remove(&self, record: &Record<TemporalExtent>) -> IndexResult<bool> {
        self.inner.core.remove(record)
    }

    fn find(&self, key: &Term) -> IndexResult<Option<Record<TemporalExtent>>> {
        Ok(self.inner.core.find(key)?)
    }

    fn count_triple(&self, added: bool) -> IndexResult<()> {
        self.inner.core.count_triple(added)
    }

    fn rebuild(&self, records: Vec<Record<TemporalExtent>>, triples: usize) -> IndexResult<bool> {
        self.inner.core.rebuild(records, triples)
    }

    fn is_exact(&self) -> bool {
        self.inner.core.is_exact()
    }

    fn size(&self) -> IndexResult<usize> {
        Ok(self.inner.size()?)
    }

    fn iter(&self) -> IndexResult<RecordIter<TemporalExtent>> {
        Ok(Box::new(self.inner.records()?.into_iter()))
    }

    fn record_factory(&self) -> &TemporalRecordFactory {
        &self.record_factory
    }

    fn property_functions(&self) -> Vec<Arc<dyn IndexPropertyFunction>> {
        TemporalRelation::ALL
            .into_iter()
            .map(|relation| {
                let function: Arc<dyn IndexPropertyFunction> =
                    Arc::new(self.property_function(relation));
                function
            })
            .collect()
    }
}

impl RelationIndex for TemporalIndex {
    type Relation = TemporalRelation;

    fn iter_related(
        &self,
        value: &TemporalExtent,
        relation: TemporalRelation,
    ) -> IndexResult<RecordIter<TemporalExtent>> {
        Ok(self.inner.bind_first_var(relation, value, None)?)
    }

    fn estimate_related(&self, value: &TemporalExtent, relation: TemporalRelation) -> IndexResult<u64> {
        self.property_function(relation).estimate_first_var(value)
    }
}
