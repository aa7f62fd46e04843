use crate::extent::TemporalExtent;
use crate::scan::{Scan, ScanRole};
use parliament_index::Relation;
use parliament_model::vocab::pt;
use parliament_model::NamedNode;
use std::fmt;
use std::ops::Bound::{Excluded, Unbounded};

/// A relation between two temporal extents `x REL y`.
///
/// The thirteen relations of Allen's interval algebra hold between intervals only. The remaining
/// relations also accept instants, see [TemporalRelation::test].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalRelation {
    IntervalBefore,
    IntervalAfter,
    IntervalMeets,
    IntervalMetBy,
    IntervalOverlaps,
    IntervalOverlappedBy,
    IntervalStarts,
    IntervalStartedBy,
    IntervalDuring,
    IntervalContains,
    IntervalFinishes,
    IntervalFinishedBy,
    IntervalEquals,
    IntervalStartsBefore,
    IntervalFinishesAfter,
    Before,
    After,
    HasBeginning,
    HasEnd,
    Inside,
    InstantEquals,
}

impl TemporalRelation {
    pub const ALL: [Self; 21] = [
        Self::IntervalBefore,
        Self::IntervalAfter,
        Self::IntervalMeets,
        Self::IntervalMetBy,
        Self::IntervalOverlaps,
        Self::IntervalOverlappedBy,
        Self::IntervalStarts,
        Self::IntervalStartedBy,
        Self::IntervalDuring,
        Self::IntervalContains,
        Self::IntervalFinishes,
        Self::IntervalFinishedBy,
        Self::IntervalEquals,
        Self::IntervalStartsBefore,
        Self::IntervalFinishesAfter,
        Self::Before,
        Self::After,
        Self::HasBeginning,
        Self::HasEnd,
        Self::Inside,
        Self::InstantEquals,
    ];

    /// The local name of the property function in the `pt:` namespace.
    pub fn name(self) -> &'static str {
        match self {
            Self::IntervalBefore => "intervalBefore",
            Self::IntervalAfter => "intervalAfter",
            Self::IntervalMeets => "intervalMeets",
            Self::IntervalMetBy => "intervalMetBy",
            Self::IntervalOverlaps => "intervalOverlaps",
            Self::IntervalOverlappedBy => "intervalOverlappedBy",
            Self::IntervalStarts => "intervalStarts",
            Self::IntervalStartedBy => "intervalStartedBy",
            Self::IntervalDuring => "intervalDuring",
            Self::IntervalContains => "intervalContains",
            Self::IntervalFinishes => "intervalFinishes",
            Self::IntervalFinishedBy => "intervalFinishedBy",
            Self::IntervalEquals => "intervalEquals",
            Self::IntervalStartsBefore => "intervalStartsBefore",
            Self::IntervalFinishesAfter => "intervalFinishesAfter",
            Self::Before => "before",
            Self::After => "after",
            Self::HasBeginning => "hasBeginning",
            Self::HasEnd => "hasEnd",
            Self::Inside => "inside",
            Self::InstantEquals => "instantEquals",
        }
    }

    pub fn uri(self) -> NamedNode {
        NamedNode::new_unchecked(format!("{}{}", pt::NAMESPACE, self.name()))
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        let name = uri.strip_prefix(pt::NAMESPACE)?;
        Self::ALL
            .into_iter()
            .find(|relation| relation.name() == name)
    }

    /// Whether `x` may be the first argument of the relation.
    fn accepts_first(self, x: &TemporalExtent) -> bool {
        match self {
            Self::IntervalStartsBefore | Self::IntervalFinishesAfter | Self::Before | Self::After => {
                true
            }
            Self::InstantEquals => x.is_instant(),
            _ => x.is_interval(),
        }
    }

    /// Whether `y` may be the second argument of the relation.
    fn accepts_second(self, y: &TemporalExtent) -> bool {
        match self {
            Self::IntervalStartsBefore | Self::IntervalFinishesAfter | Self::Before | Self::After => {
                true
            }
            Self::HasBeginning | Self::HasEnd | Self::Inside | Self::InstantEquals => {
                y.is_instant()
            }
            _ => y.is_interval(),
        }
    }

    /// Decides whether `x REL y` holds.
    pub fn test(self, x: &TemporalExtent, y: &TemporalExtent) -> bool {
        if !self.accepts_first(x) || !self.accepts_second(y) {
            return false;
        }
        let (xs, xe, ys, ye) = (x.start(), x.end(), y.start(), y.end());
        match self {
            Self::IntervalBefore | Self::Before => xe < ys,
            Self::IntervalAfter | Self::After => xs > ye,
            Self::IntervalMeets => xe == ys,
            Self::IntervalMetBy => ye == xs,
            Self::IntervalOverlaps => xs < ys && ys < xe && xe < ye,
            Self::IntervalOverlappedBy => ys < xs && xs < ye && ye < xe,
            Self::IntervalStarts => xs == ys && xe < ye,
            Self::IntervalStartedBy => xs == ys && ye < xe,
            Self::IntervalDuring => ys < xs && xe < ye,
            Self::IntervalContains => xs < ys && ye < xe,
            Self::IntervalFinishes => ys < xs && xe == ye,
            Self::IntervalFinishedBy => xs < ys && xe == ye,
            Self::IntervalEquals => xs == ys && xe == ye,
            Self::IntervalStartsBefore => xs < ys,
            Self::IntervalFinishesAfter => xe > ye,
            Self::HasBeginning => xs == ys,
            Self::HasEnd => xe == ys,
            Self::Inside => xs < ys && ys < xe,
            Self::InstantEquals => xs == ys,
        }
    }

    /// The scan that finds the candidates for `x` given `y`. Returns [None] if `y` cannot be the
    /// second argument.
    pub fn first_scan(self, y: &TemporalExtent) -> Option<Scan> {
        if !self.accepts_second(y) {
            return None;
        }
        let (ys, ye) = (y.start(), y.end());
        Some(match self {
            Self::IntervalBefore | Self::Before => Scan::new(Unbounded, Excluded(ys), ScanRole::Ends),
            Self::IntervalAfter | Self::After => Scan::new(Excluded(ye), Unbounded, ScanRole::Starts),
            Self::IntervalMeets | Self::HasEnd => Scan::at(ys, ScanRole::Ends),
            Self::IntervalMetBy => Scan::at(ye, ScanRole::Starts),
            Self::IntervalOverlaps => Scan::new(Excluded(ys), Excluded(ye), ScanRole::Ends),
            Self::IntervalOverlappedBy | Self::IntervalDuring => {
                Scan::new(Excluded(ys), Excluded(ye), ScanRole::Starts)
            }
            Self::IntervalStarts
            | Self::IntervalStartedBy
            | Self::IntervalEquals
            | Self::HasBeginning => Scan::at(ys, ScanRole::Starts),
            Self::IntervalContains | Self::IntervalStartsBefore | Self::Inside => {
                Scan::new(Unbounded, Excluded(ys), ScanRole::Starts)
            }
            Self::IntervalFinishes | Self::IntervalFinishedBy => Scan::at(ye, ScanRole::Ends),
            Self::IntervalFinishesAfter => Scan::new(Excluded(ye), Unbounded, ScanRole::Ends),
            Self::InstantEquals => Scan::at(ys, ScanRole::InstantsOnly),
        })
    }

    /// The scan that finds the candidates for `y` given `x`. Returns [None] if `x` cannot be the
    /// first argument.
    pub fn second_scan(self, x: &TemporalExtent) -> Option<Scan> {
        if !self.accepts_first(x) {
            return None;
        }
        let (xs, xe) = (x.start(), x.end());
        Some(match self {
            Self::IntervalBefore | Self::Before => Scan::new(Excluded(xe), Unbounded, ScanRole::Starts),
            Self::IntervalAfter | Self::After => Scan::new(Unbounded, Excluded(xs), ScanRole::Ends),
            Self::IntervalMeets => Scan::at(xe, ScanRole::Starts),
            Self::IntervalMetBy => Scan::at(xs, ScanRole::Ends),
            Self::IntervalOverlaps | Self::IntervalContains => {
                Scan::new(Excluded(xs), Excluded(xe), ScanRole::Starts)
            }
            Self::IntervalOverlappedBy => Scan::new(Excluded(xs), Excluded(xe), ScanRole::Ends),
            Self::IntervalStarts | Self::IntervalStartedBy | Self::IntervalEquals => {
                Scan::at(xs, ScanRole::Starts)
            }
            Self::IntervalDuring => Scan::new(Unbounded, Excluded(xs), ScanRole::Starts),
            Self::IntervalFinishes | Self::IntervalFinishedBy => Scan::at(xe, ScanRole::Ends),
            Self::IntervalStartsBefore => Scan::new(Excluded(xs), Unbounded, ScanRole::Starts),
            Self::IntervalFinishesAfter => Scan::new(Unbounded, Excluded(xe), ScanRole::Ends),
            Self::HasBeginning | Self::InstantEquals => Scan::at(xs, ScanRole::InstantsOnly),
            Self::HasEnd => Scan::at(xe, ScanRole::InstantsOnly),
            Self::Inside => Scan::new(Excluded(xs), Excluded(xe), ScanRole::InstantsOnly),
        })
    }
}

impl Relation<TemporalExtent> for TemporalRelation {
    fn relate(&self, a: &TemporalExtent, b: &TemporalExtent) -> bool {
        self.test(a, b)
    }
}

impl fmt::Display for TemporalRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pt:{}", self.name())
    }
}
