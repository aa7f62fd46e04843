//! An index over the numeric objects of a single predicate.
//!
//! The index maps each subject to its number and keeps the subjects ordered by value. This allows
//! answering triple patterns with the indexed predicate and range filters over its objects.
//! Each subject has at most one value. A later triple replaces the value of an earlier one, which
//! leaves the index inexact until the graph again holds a single value per subject.

mod factory;
mod number;
mod querier;

pub use factory::{
    numeric_factory, NumericIndexFactory, DIRECTORY_PROPERTY, PREDICATE_PROPERTY, TYPE_PROPERTY,
};
pub use number::Number;
pub use querier::{NumericPatternQuerier, NumericRangeSource};

use crate::content::{IndexCore, RecordStore};
use crate::index::{Index, RangeIndex, RecordFactory, RecordIter};
use crate::lifecycle::IndexState;
use crate::persistence::{RecordFile, ValueCodec};
use crate::query::{IndexPatternQuerier, RangeSource};
use crate::record::Record;
use number::{is_empty_range, NumberKey};
use parliament_common::error::{CorruptionError, IndexStateError};
use parliament_common::IndexResult;
use parliament_model::{Literal, NamedNode, Term, Triple};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::ops::Bound;
use std::str::FromStr;
use std::sync::Arc;

/// A number together with the literal it was read from.
///
/// Two values are equal if their literals are equal. `"30"` and `"030"` are different values with
/// the same number.
#[derive(Debug, Clone)]
pub struct NumericValue<N> {
    pub number: N,
    pub literal: Literal,
}

impl<N: Number> NumericValue<N> {
    /// Reads `literal`. Returns [None] if it is not a number of type `N`.
    pub fn from_literal(literal: Literal) -> Option<Self> {
        let number = N::from_literal(&literal)?;
        Some(Self { number, literal })
    }
}

impl<N: Number> From<N> for NumericValue<N> {
    fn from(number: N) -> Self {
        Self {
            number,
            literal: number.to_literal(),
        }
    }
}

impl<N> PartialEq for NumericValue<N> {
    fn eq(&self, other: &Self) -> bool {
        self.literal == other.literal
    }
}

impl<N> Eq for NumericValue<N> {}

/// Creates numeric records from the triples of one predicate.
#[derive(Debug, Clone)]
pub struct NumericRecordFactory<N> {
    predicates: [NamedNode; 1],
    number: PhantomData<N>,
}

impl<N: Number> NumericRecordFactory<N> {
    pub fn new(predicate: NamedNode) -> Self {
        Self {
            predicates: [predicate],
            number: PhantomData,
        }
    }

    pub fn predicate(&self) -> &NamedNode {
        &self.predicates[0]
    }
}

impl<N: Number> RecordFactory for NumericRecordFactory<N> {
    type Value = NumericValue<N>;

    fn predicates(&self) -> &[NamedNode] {
        &self.predicates
    }

    fn create_record(&self, triple: &Triple) -> Option<Record<NumericValue<N>>> {
        let Term::Literal(literal) = &triple.object else {
            return None;
        };
        let value = NumericValue::from_literal(literal.clone())?;
        Some(Record::new(triple.subject.clone(), value))
    }
}

/// Stores values as their literal in N-Triples syntax.
struct NumericCodec;

impl<N: Number> ValueCodec<NumericValue<N>> for NumericCodec {
    fn encode(&self, value: &NumericValue<N>) -> String {
        value.literal.to_string()
    }

    fn decode(&self, text: &str) -> Result<NumericValue<N>, CorruptionError> {
        let Term::Literal(literal) = Term::from_str(text).map_err(CorruptionError::new)? else {
            return Err(CorruptionError::msg(format!("'{text}' is not a literal")));
        };
        NumericValue::from_literal(literal)
            .ok_or_else(|| CorruptionError::msg(format!("invalid {} '{text}'", N::TYPE_NAME)))
    }
}

/// The subjects of a [NumericIndex] with their values and ordered by number.
pub(crate) struct NumericContent<N> {
    values: FxHashMap<Term, NumericValue<N>>,
    by_number: BTreeMap<NumberKey<N>, Vec<Term>>,
}

impl<N> Default for NumericContent<N> {
    fn default() -> Self {
        Self {
            values: FxHashMap::default(),
            by_number: BTreeMap::new(),
        }
    }
}

impl<N: Number> NumericContent<N> {
    fn unlink(&mut self, key: &Term, number: N) {
        let number = NumberKey::new(number);
        if let Some(nodes) = self.by_number.get_mut(&number) {
            nodes.retain(|node| node != key);
            if nodes.is_empty() {
                self.by_number.remove(&number);
            }
        }
    }

    /// Returns the records whose number lies within the bounds, ordered by number.
    fn range(&self, lower: Bound<N>, upper: Bound<N>) -> Vec<Record<NumericValue<N>>> {
        let lower = lower.map(NumberKey::new);
        let upper = upper.map(NumberKey::new);
        if is_empty_range(&lower, &upper) {
            return Vec::new();
        }
        self.by_number
            .range((lower, upper))
            .flat_map(|(_, nodes)| nodes)
            .filter_map(|node| {
                let value = self.values.get(node)?;
                Some(Record::new(node.clone(), value.clone()))
            })
            .collect()
    }
}

impl<N: Number> RecordStore for NumericContent<N> {
    type Value = NumericValue<N>;

    fn insert(&mut self, record: Record<NumericValue<N>>) -> bool {
        if let Some(previous) = self.values.get(&record.key) {
            if *previous == record.value {
                return false;
            }
            let previous = previous.number;
            self.unlink(&record.key, previous);
        }
        self.by_number
            .entry(NumberKey::new(record.value.number))
            .or_default()
            .push(record.key.clone());
        self.values.insert(record.key, record.value);
        true
    }

    fn remove(&mut self, record: &Record<NumericValue<N>>) -> bool {
        if self.values.get(&record.key) != Some(&record.value) {
            return false;
        }
        self.values.remove(&record.key);
        self.unlink(&record.key, record.value.number);
        true
    }

    fn clear(&mut self) {
        self.values.clear();
        self.by_number.clear();
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn get(&self, key: &Term) -> Option<&NumericValue<N>> {
        self.values.get(key)
    }

    fn records(&self) -> Vec<Record<NumericValue<N>>> {
        self.values
            .iter()
            .map(|(key, value)| Record::new(key.clone(), value.clone()))
            .collect()
    }
}

/// The shared part of a [NumericIndex] that is also used by its querier and range source.
pub(crate) struct NumericInner<N> {
    predicate: NamedNode,
    core: IndexCore<NumericContent<N>, NumericCodec>,
}

impl<N: Number> NumericInner<N> {
    pub(crate) fn predicate(&self) -> &NamedNode {
        &self.predicate
    }

    pub(crate) fn find(&self, key: &Term) -> Result<Option<NumericValue<N>>, IndexStateError> {
        self.core.read(|content| content.get(key).cloned())
    }

    pub(crate) fn range(
        &self,
        lower: Bound<N>,
        upper: Bound<N>,
    ) -> Result<Vec<Record<NumericValue<N>>>, IndexStateError> {
        self.core.read(|content| content.range(lower, upper))
    }

    /// Returns the records whose value is exactly `literal`.
    pub(crate) fn with_literal(
        &self,
        literal: &Literal,
    ) -> Result<Vec<Record<NumericValue<N>>>, IndexStateError> {
        let Some(number) = N::from_literal(literal) else {
            return Ok(Vec::new());
        };
        let mut records = self.range(Bound::Included(number), Bound::Included(number))?;
        records.retain(|record| record.value.literal == *literal);
        Ok(records)
    }

    pub(crate) fn records(&self) -> Result<Vec<Record<NumericValue<N>>>, IndexStateError> {
        self.core.records()
    }

    pub(crate) fn size(&self) -> Result<usize, IndexStateError> {
        self.core.size()
    }
}

/// An index of the numbers of type `N` that are objects of one predicate.
pub struct NumericIndex<N> {
    inner: Arc<NumericInner<N>>,
    record_factory: NumericRecordFactory<N>,
}

impl<N: Number> NumericIndex<N> {
    /// Creates an in-memory index.
    pub fn new(predicate: NamedNode) -> Self {
        Self::create(predicate, None)
    }

    /// Creates an index that loads its content from `file` when it is opened and writes it back on
    /// [Index::flush] and [Index::close].
    pub fn persistent(predicate: NamedNode, file: RecordFile) -> Self {
        Self::create(predicate, Some(file))
    }

    fn create(predicate: NamedNode, file: Option<RecordFile>) -> Self {
        let label = format!("numeric {} index for {predicate}", N::TYPE_NAME);
        Self {
            inner: Arc::new(NumericInner {
                predicate: predicate.clone(),
                core: IndexCore::new(label, NumericCodec, file),
            }),
            record_factory: NumericRecordFactory::new(predicate),
        }
    }

    pub fn predicate(&self) -> &NamedNode {
        &self.inner.predicate
    }

    /// Returns the records whose number equals `number`.
    pub fn query(&self, number: N) -> IndexResult<RecordIter<NumericValue<N>>> {
        self.iter_range(Some(&number), Some(&number))
    }
}

impl<N: Number> Index for NumericIndex<N> {
    type Value = NumericValue<N>;
    type Factory = NumericRecordFactory<N>;

    fn label(&self) -> &str {
        self.inner.core.label()
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

    fn add(&self, record: Record<NumericValue<N>>) -> IndexResult<bool> {
        self.inner.core.add(record)
    }

    fn remove(&self, record: &Record<NumericValue<N>>) -> IndexResult<bool> {
        self.inner.core.remove(record)
    }

    fn find(&self, key: &Term) -> IndexResult<Option<Record<NumericValue<N>>>> {
        Ok(self.inner.core.find(key)?)
    }

    fn count_triple(&self, added: bool) -> IndexResult<()> {
        self.inner.core.count_triple(added)
    }

    fn rebuild(&self, records: Vec<Record<NumericValue<N>>>, triples: usize) -> IndexResult<bool> {
        self.inner.core.rebuild(records, triples)
    }

    fn is_exact(&self) -> bool {
        self.inner.core.is_exact()
    }

    fn size(&self) -> IndexResult<usize> {
        Ok(self.inner.size()?)
    }

    fn iter(&self) -> IndexResult<RecordIter<NumericValue<N>>> {
        Ok(Box::new(self.inner.records()?.into_iter()))
    }

    fn record_factory(&self) -> &NumericRecordFactory<N> {
        &self.record_factory
    }

    fn pattern_querier(&self) -> Option<Arc<dyn IndexPatternQuerier>> {
        Some(Arc::new(NumericPatternQuerier::new(Arc::clone(&self.inner))))
    }

    fn range_source(&self) -> Option<Arc<dyn RangeSource>> {
        Some(Arc::new(NumericRangeSource::new(Arc::clone(&self.inner))))
    }
}

impl<N: Number> RangeIndex for NumericIndex<N> {
    type Key = N;

    fn iter_range(
        &self,
        start: Option<&N>,
        end: Option<&N>,
    ) -> IndexResult<RecordIter<NumericValue<N>>> {
        let lower = start.map_or(Bound::Unbounded, |start| Bound::Included(*start));
        let upper = end.map_or(Bound::Unbounded, |end| Bound::Included(*end));
        Ok(Box::new(self.inner.range(lower, upper)?.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::IndexHandle;
    use parliament_common::error::IndexErrorKind;
    use parliament_model::vocab::xsd;

    #[test]
    fn later_values_replace_earlier_ones() -> IndexResult<()> {
        let index = open_index();
        assert!(index.add(Record::new(node("a"), 5.into()))?);
        assert!(!index.add(Record::new(node("a"), 5.into()))?);
        assert!(index.add(Record::new(node("a"), 7.into()))?);
        assert!(index.add(Record::new(node("b"), 7.into()))?);

        assert_eq!(Index::size(&index)?, 2);
        assert_eq!(keys(index.query(5)?), Vec::<Term>::new());
        assert_eq!(keys(index.query(7)?), vec![node("a"), node("b")]);
        assert_eq!(index.find(&node("a"))?, Some(Record::new(node("a"), 7.into())));
        Ok(())
    }

    #[test]
    fn records_can_be_found_until_removed() -> IndexResult<()> {
        let index = open_index();
        let record = Record::new(node("a"), 3.into());
        index.add(record.clone())?;
        assert_eq!(index.find(&node("a"))?, Some(record.clone()));

        index.remove(&record)?;
        assert_eq!(index.find(&node("a"))?, None);

        index.add(record)?;
        index.add(Record::new(node("b"), 4.into()))?;
        Index::clear(&index)?;
        assert_eq!(keys(Index::iter(&index)?), Vec::<Term>::new());
        Ok(())
    }

    #[test]
    fn removal_requires_the_current_literal() -> IndexResult<()> {
        let index = open_index();
        index.add(Record::new(node("a"), 5.into()))?;
        assert!(!index.remove(&Record::new(node("a"), 6.into()))?);
        assert!(!index.remove(&Record::new(node("a"), integer("05")))?);
        assert!(index.remove(&Record::new(node("a"), 5.into()))?);
        assert_eq!(Index::size(&index)?, 0);
        assert_eq!(keys(Index::iter(&index)?), Vec::<Term>::new());
        Ok(())
    }

    #[test]
    fn range_scans_are_inclusive_and_ordered() -> IndexResult<()> {
        let index = open_index();
        for (name, value) in [("a", 10), ("b", -3), ("c", 4), ("d", 4), ("e", 11)] {
            index.add(Record::new(node(name), value.into()))?;
        }
        assert_eq!(
            keys(index.iter_range(Some(&-3), Some(&10))?),
            vec![node("b"), node("c"), node("d"), node("a")]
        );
        assert_eq!(keys(index.iter_range(Some(&11), None)?), vec![node("e")]);
        assert_eq!(keys(index.iter_range(Some(&5), Some(&4))?), Vec::<Term>::new());
        Ok(())
    }

    #[test]
    fn unreadable_and_repeated_values_make_the_index_inexact() -> IndexResult<()> {
        let index = open_index();
        let triple = |object: Literal| Triple::new(node_iri("a"), predicate(), object);

        assert!(index.triple_added(&triple(Literal::from(3)))?);
        assert!(Index::is_exact(&index));

        assert!(!index.triple_added(&triple(Literal::from(3.5)))?);
        assert!(!index.triple_added(&triple(Literal::new_simple_literal("3")))?);
        assert!(!index.triple_added(&Triple::new(
            node_iri("a"),
            NamedNode::new_unchecked("http://ex/other"),
            Literal::from(4)
        ))?);
        assert_eq!(Index::size(&index)?, 1);
        assert!(!Index::is_exact(&index));

        index.triple_removed(&triple(Literal::from(3.5)))?;
        index.triple_removed(&triple(Literal::new_simple_literal("3")))?;
        assert!(Index::is_exact(&index));

        // a second number of the same subject replaces the first one
        assert!(index.triple_added(&triple(Literal::from(4)))?);
        assert!(!Index::is_exact(&index));
        index.triple_removed(&triple(Literal::from(3)))?;
        assert!(Index::is_exact(&index));
        assert_eq!(
            index.find(&node("a"))?.map(|record| record.value.number),
            Some(4)
        );
        Ok(())
    }

    #[test]
    fn values_keep_their_lexical_form() -> IndexResult<()> {
        let index = open_index();
        let padded = integer("041");
        assert_eq!(padded.number, 41);
        assert_ne!(padded, NumericValue::from(41));
        index.add(Record::new(node("a"), padded.clone()))?;

        let found = index.query(41)?.next().map(|record| record.value.literal);
        assert_eq!(found, Some(padded.literal));
        Ok(())
    }

    #[test]
    fn mutations_require_an_open_index() -> IndexResult<()> {
        let index = NumericIndex::<i64>::new(predicate());
        let error = index.add(Record::new(node("a"), 1.into())).unwrap_err();
        assert_eq!(error.kind(), IndexErrorKind::State);

        Index::open(&index)?;
        Index::close(&index)?;
        let error = Index::open(&index).unwrap_err();
        assert_eq!(error.kind(), IndexErrorKind::State);
        Ok(())
    }

    #[test]
    fn content_survives_a_restart() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let file = RecordFile::new(dir.path().join("numbers.txt"));
        let scientific = Literal::new_typed_literal("2.50E0", xsd::DOUBLE);

        let index = NumericIndex::<f64>::persistent(predicate(), file.clone());
        Index::open(&index)?;
        index.add(Record::new(node("a"), 1.5.into()))?;
        index.add(Record::new(node("b"), f64::INFINITY.into()))?;
        index.add(Record::new(
            node("c"),
            NumericValue::from_literal(scientific.clone()).ok_or("not a double")?,
        ))?;
        Index::close(&index)?;

        let reopened = NumericIndex::<f64>::persistent(predicate(), file.clone());
        Index::open(&reopened)?;
        assert_eq!(Index::size(&reopened)?, 3);
        assert_eq!(keys(reopened.query(f64::INFINITY)?), vec![node("b")]);
        assert_eq!(
            reopened.find(&node("c"))?.map(|record| record.value.literal),
            Some(scientific)
        );

        Index::delete(&reopened)?;
        assert!(!file.exists());
        Ok(())
    }

    #[test]
    fn corrupted_files_fail_to_open() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("numbers.txt");
        std::fs::write(&path, "<http://ex/a>\t\"one\"\n")?;

        let index = NumericIndex::<i64>::persistent(predicate(), RecordFile::new(path));
        let error = Index::open(&index).unwrap_err();
        assert_eq!(error.kind(), IndexErrorKind::OpenFailure);
        Ok(())
    }

    fn open_index() -> NumericIndex<i64> {
        let index = NumericIndex::new(predicate());
        Index::open(&index).unwrap();
        index
    }

    fn integer(lexical: &str) -> NumericValue<i64> {
        NumericValue::from_literal(Literal::new_typed_literal(lexical, xsd::INTEGER)).unwrap()
    }

    fn keys<V>(records: RecordIter<V>) -> Vec<Term> {
        records.map(|record| record.key).collect()
    }

    fn predicate() -> NamedNode {
        NamedNode::new_unchecked("http://ex/age")
    }

    fn node_iri(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://ex/{name}"))
    }

    fn node(name: &str) -> Term {
        node_iri(name).into()
    }
}
