use crate::extent::TemporalExtent;
use crate::index::TemporalInner;
use crate::relation::TemporalRelation;
use parliament_common::CancellationFlag;
use parliament_index::Record;
use std::collections::VecDeque;
use std::ops::Bound;
use std::sync::Arc;

/// The role of an instant in the ordered instant set of a temporal index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum KeyRole {
    Instant,
    Start,
    End,
}

/// An entry of the instant set. Every stored instant has one key, every stored interval has a
/// key for its start and one for its end.
///
/// Keys are ordered by time, then standalone instants before interval boundaries, then starts
/// before ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct InstantKey {
    millis: i64,
    role: KeyRole,
    extent: TemporalExtent,
}

impl InstantKey {
    pub(crate) fn of(extent: TemporalExtent) -> Vec<Self> {
        match extent {
            TemporalExtent::Instant(millis) => vec![Self {
                millis,
                role: KeyRole::Instant,
                extent,
            }],
            TemporalExtent::Interval { start, end } => vec![
                Self {
                    millis: start,
                    role: KeyRole::Start,
                    extent,
                },
                Self {
                    millis: end,
                    role: KeyRole::End,
                    extent,
                },
            ],
        }
    }

    /// The smallest possible key at `millis`.
    fn floor(millis: i64) -> Self {
        Self {
            millis,
            role: KeyRole::Instant,
            extent: TemporalExtent::Instant(i64::MIN),
        }
    }
}

/// Which keys a [Scan] visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRole {
    /// Interval starts and standalone instants.
    Starts,
    /// Interval ends and standalone instants.
    Ends,
    InstantsOnly,
}

impl ScanRole {
    fn accepts(self, role: KeyRole) -> bool {
        match self {
            Self::Starts => role != KeyRole::End,
            Self::Ends => role != KeyRole::Start,
            Self::InstantsOnly => role == KeyRole::Instant,
        }
    }
}

/// A range scan over the instant set. It returns a superset of the extents standing in a relation
/// to a bound extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    pub lower: Bound<i64>,
    pub upper: Bound<i64>,
    pub role: ScanRole,
}

impl Scan {
    pub fn new(lower: Bound<i64>, upper: Bound<i64>, role: ScanRole) -> Self {
        Self { lower, upper, role }
    }

    /// A scan of the keys at exactly `millis`.
    pub fn at(millis: i64, role: ScanRole) -> Self {
        Self::new(Bound::Included(millis), Bound::Included(millis), role)
    }

    /// Converts the bounds on milliseconds into bounds on [InstantKey]s. Returns [None] if no key
    /// can lie within the bounds.
    fn key_bounds(&self) -> Option<(Bound<InstantKey>, Bound<InstantKey>)> {
        let lower = match self.lower {
            Bound::Included(millis) => Bound::Included(InstantKey::floor(millis)),
            Bound::Excluded(millis) => Bound::Included(InstantKey::floor(millis.checked_add(1)?)),
            Bound::Unbounded => Bound::Unbounded,
        };
        let upper = match self.upper {
            Bound::Included(millis) => millis
                .checked_add(1)
                .map_or(Bound::Unbounded, |next| Bound::Excluded(InstantKey::floor(next))),
            Bound::Excluded(millis) => Bound::Excluded(InstantKey::floor(millis)),
            Bound::Unbounded => Bound::Unbounded,
        };
        if let (Bound::Included(start), Bound::Excluded(end)) = (&lower, &upper) {
            if start >= end {
                return None;
            }
        }
        Some((lower, upper))
    }
}

/// The exact test applied to the candidates of a [Scan].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Decider {
    pub(crate) relation: TemporalRelation,
    pub(crate) bound: TemporalExtent,
    /// Whether candidates are the first argument of the relation.
    pub(crate) candidate_is_first: bool,
}

impl Decider {
    fn accepts(&self, candidate: &TemporalExtent) -> bool {
        if self.candidate_is_first {
            self.relation.test(candidate, &self.bound)
        } else {
            self.relation.test(&self.bound, candidate)
        }
    }
}

const BATCH_SIZE: usize = 256;

/// Lazily walks a [Scan] and yields the records accepted by its [Decider].
///
/// The index lock is only held while a batch of keys is collected. The iterator ends early if the
/// index is closed or the query is cancelled.
pub(crate) struct ScanIter {
    inner: Arc<TemporalInner>,
    lower: Bound<InstantKey>,
    upper: Bound<InstantKey>,
    role: ScanRole,
    decider: Decider,
    cancellation: Option<CancellationFlag>,
    pending: VecDeque<Record<TemporalExtent>>,
    exhausted: bool,
}

impl ScanIter {
    pub(crate) fn new(
        inner: Arc<TemporalInner>,
        scan: Scan,
        decider: Decider,
        cancellation: Option<CancellationFlag>,
    ) -> Self {
        let (lower, upper, exhausted) = match scan.key_bounds() {
            Some((lower, upper)) => (lower, upper, false),
            None => (Bound::Unbounded, Bound::Unbounded, true),
        };
        Self {
            inner,
            lower,
            upper,
            role: scan.role,
            decider,
            cancellation,
            pending: VecDeque::new(),
            exhausted,
        }
    }

    fn fill(&mut self) {
        let (lower, upper, role, decider) = (self.lower, self.upper, self.role, self.decider);
        let batch = self.inner.core.read_if_open(|content| {
            let mut last = None;
            let mut records = Vec::new();
            for key in content.instants.range((lower, upper)).take(BATCH_SIZE) {
                last = Some(*key);
                if !role.accepts(key.role) || !decider.accepts(&key.extent) {
                    continue;
                }
                if let Some(nodes) = content.nodes.get(&key.extent) {
                    records.extend(
                        nodes
                            .iter()
                            .map(|node| Record::new(node.clone(), key.extent)),
                    );
                }
            }
            (last, records)
        });
        match batch {
            Some((Some(last), records)) => {
                self.pending.extend(records);
                self.lower = Bound::Excluded(last);
            }
            Some((None, _)) | None => self.exhausted = true,
        }
    }
}

impl Iterator for ScanIter {
    type Item = Record<TemporalExtent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(record);
            }
            if self.exhausted
                || self
                    .cancellation
                    .as_ref()
                    .is_some_and(CancellationFlag::is_cancelled)
            {
                return None;
            }
            self.fill();
        }
    }
}
