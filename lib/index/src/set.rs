use crate::handle::IndexHandle;
use crate::lifecycle::IndexState;
use crate::query::{IndexPatternQuerier, IndexPropertyFunction, RangeSource};
use parliament_model::NamedNode;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// The query hooks of the open indexes of one graph.
///
/// An [IndexSet] is a snapshot taken when a query starts. Indexes that are not open or that do not
/// represent their graph exactly are left out, so a query without them reads the graph instead.
#[derive(Clone, Default)]
pub struct IndexSet {
    indexes: Vec<Arc<dyn IndexHandle>>,
    functions: FxHashMap<NamedNode, Arc<dyn IndexPropertyFunction>>,
    queriers: Vec<Arc<dyn IndexPatternQuerier>>,
    ranges: Vec<Arc<dyn RangeSource>>,
}

impl IndexSet {
    pub fn new(indexes: Vec<Arc<dyn IndexHandle>>) -> Self {
        let indexes: Vec<_> = indexes
            .into_iter()
            .filter(|index| {
                if index.state() != IndexState::Open {
                    return false;
                }
                let exact = index.is_exact();
                if !exact {
                    tracing::debug!(index = index.label(), "Index does not cover its graph, skipping");
                }
                exact
            })
            .collect();
        let mut functions = FxHashMap::default();
        let mut queriers = Vec::new();
        let mut ranges = Vec::new();
        for index in &indexes {
            for function in index.property_functions() {
                functions.insert(function.uri().clone(), function);
            }
            queriers.extend(index.pattern_querier());
            ranges.extend(index.range_source());
        }
        Self {
            indexes,
            functions,
            queriers,
            ranges,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn indexes(&self) -> &[Arc<dyn IndexHandle>] {
        &self.indexes
    }

    /// Returns the index property function with the given URI.
    pub fn property_function(&self, uri: &NamedNode) -> Option<&Arc<dyn IndexPropertyFunction>> {
        self.functions.get(uri)
    }

    pub fn is_index_function(&self, uri: &NamedNode) -> bool {
        self.functions.contains_key(uri)
    }

    pub fn queriers(&self) -> &[Arc<dyn IndexPatternQuerier>] {
        &self.queriers
    }

    pub fn range_sources(&self) -> &[Arc<dyn RangeSource>] {
        &self.ranges
    }

    /// Returns the range source for the objects of `predicate`.
    pub fn range_source_for(&self, predicate: &NamedNode) -> Option<&Arc<dyn RangeSource>> {
        self.ranges
            .iter()
            .find(|source| source.predicate() == predicate)
    }
}

impl fmt::Debug for IndexSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSet")
            .field(
                "indexes",
                &self
                    .indexes
                    .iter()
                    .map(|index| index.label())
                    .collect::<Vec<_>>(),
            )
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
