use oxsdatatypes::{Double, Integer};
use parliament_model::vocab::xsd;
use parliament_model::{Literal, NamedNodeRef};
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::ops::Bound;
use std::str::FromStr;

/// A number type that can be stored in a [NumericIndex](super::NumericIndex).
pub trait Number: Copy + Debug + Display + Send + Sync + 'static {
    /// A short name of the type, used in labels.
    const TYPE_NAME: &'static str;

    /// The datatypes of the literals whose values are indexed.
    fn datatypes() -> &'static [NamedNodeRef<'static>];

    /// Reads the value of `literal`. Returns [None] for other datatypes and invalid lexical forms.
    fn from_literal(literal: &Literal) -> Option<Self>;

    /// The canonical literal of the value.
    fn to_literal(self) -> Literal;

    fn total_cmp(&self, other: &Self) -> Ordering;

    /// The value used for ordering. Equal numbers have equal keys.
    fn normalized(self) -> Self {
        self
    }

    /// Converts the lower bound of a range filter. The converted bound may include more values.
    fn lower_bound(bound: Bound<f64>) -> Bound<Self>;

    /// Converts the upper bound of a range filter. The converted bound may include more values.
    fn upper_bound(bound: Bound<f64>) -> Bound<Self>;
}

fn has_datatype(literal: &Literal, datatypes: &[NamedNodeRef<'_>]) -> bool {
    datatypes.contains(&literal.datatype())
}

const INTEGER_DATATYPES: [NamedNodeRef<'static>; 12] = [
    xsd::INTEGER,
    xsd::LONG,
    xsd::INT,
    xsd::SHORT,
    xsd::BYTE,
    xsd::NON_NEGATIVE_INTEGER,
    xsd::NON_POSITIVE_INTEGER,
    xsd::POSITIVE_INTEGER,
    xsd::NEGATIVE_INTEGER,
    xsd::UNSIGNED_INT,
    xsd::UNSIGNED_SHORT,
    xsd::UNSIGNED_BYTE,
];

impl Number for i64 {
    const TYPE_NAME: &'static str = "integer";

    fn datatypes() -> &'static [NamedNodeRef<'static>] {
        &INTEGER_DATATYPES
    }

    fn from_literal(literal: &Literal) -> Option<Self> {
        if !has_datatype(literal, Self::datatypes()) {
            return None;
        }
        Integer::from_str(literal.value()).ok().map(i64::from)
    }

    fn to_literal(self) -> Literal {
        Literal::from(self)
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Saturating conversion widens the bound"
    )]
    fn lower_bound(bound: Bound<f64>) -> Bound<Self> {
        match bound {
            Bound::Included(value) | Bound::Excluded(value) if !value.is_nan() => {
                Bound::Included(value.floor() as i64)
            }
            _ => Bound::Unbounded,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Saturating conversion widens the bound"
    )]
    fn upper_bound(bound: Bound<f64>) -> Bound<Self> {
        match bound {
            Bound::Included(value) | Bound::Excluded(value) if !value.is_nan() => {
                Bound::Included(value.ceil() as i64)
            }
            _ => Bound::Unbounded,
        }
    }
}

const DOUBLE_DATATYPES: [NamedNodeRef<'static>; 2] = [xsd::DOUBLE, xsd::FLOAT];

impl Number for f64 {
    const TYPE_NAME: &'static str = "double";

    fn datatypes() -> &'static [NamedNodeRef<'static>] {
        &DOUBLE_DATATYPES
    }

    fn from_literal(literal: &Literal) -> Option<Self> {
        if !has_datatype(literal, Self::datatypes()) {
            return None;
        }
        Double::from_str(literal.value()).ok().map(f64::from)
    }

    fn to_literal(self) -> Literal {
        Literal::from(self)
    }

    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }

    fn normalized(self) -> Self {
        // -0.0 and 0.0 are equal numbers
        if self == 0.0 {
            0.0
        } else {
            self
        }
    }

    fn lower_bound(bound: Bound<f64>) -> Bound<Self> {
        match bound {
            Bound::Included(value) | Bound::Excluded(value) if value.is_nan() => Bound::Unbounded,
            Bound::Included(value) => Bound::Included(value.normalized()),
            Bound::Excluded(value) => Bound::Excluded(value.normalized()),
            Bound::Unbounded => Bound::Unbounded,
        }
    }

    fn upper_bound(bound: Bound<f64>) -> Bound<Self> {
        Self::lower_bound(bound)
    }
}

/// Orders numbers by [Number::total_cmp] on their normalized value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NumberKey<N>(pub(crate) N);

impl<N: Number> NumberKey<N> {
    pub(crate) fn new(value: N) -> Self {
        Self(value.normalized())
    }
}

impl<N: Number> PartialEq for NumberKey<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<N: Number> Eq for NumberKey<N> {}

impl<N: Number> PartialOrd for NumberKey<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N: Number> Ord for NumberKey<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Returns whether a range with these bounds contains no key. [std::collections::BTreeMap::range]
/// panics for such ranges.
pub(crate) fn is_empty_range<N: Number>(lower: &Bound<NumberKey<N>>, upper: &Bound<NumberKey<N>>) -> bool {
    match (lower, upper) {
        (Bound::Included(start), Bound::Included(end)) => start > end,
        (Bound::Included(start) | Bound::Excluded(start), Bound::Excluded(end))
        | (Bound::Excluded(start), Bound::Included(end)) => start >= end,
        _ => false,
    }
}
