use oxsdatatypes::{Boolean, DateTime, Decimal, Double, Float, Integer};
use parliament_model::vocab::{rdf, xsd};
use parliament_model::{Literal, NamedNodeRef, Term};
use std::cmp::Ordering;
use std::str::FromStr;

/// A numeric literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

impl Numeric {
    /// Reads the value of a literal with a numeric datatype. Derived integer types are read as
    /// [Numeric::Integer].
    pub fn from_literal(literal: &Literal) -> Option<Self> {
        let value = literal.value();
        let datatype = literal.datatype();
        if is_integer_datatype(datatype) {
            Integer::from_str(value).ok().map(Self::Integer)
        } else if datatype == xsd::DECIMAL {
            Decimal::from_str(value).ok().map(Self::Decimal)
        } else if datatype == xsd::FLOAT {
            Float::from_str(value).ok().map(Self::Float)
        } else if datatype == xsd::DOUBLE {
            Double::from_str(value).ok().map(Self::Double)
        } else {
            None
        }
    }

    pub fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::Literal(literal) => Self::from_literal(literal),
            _ => None,
        }
    }

    pub fn into_term(self) -> Term {
        let (value, datatype) = match self {
            Self::Integer(value) => (value.to_string(), xsd::INTEGER),
            Self::Decimal(value) => (value.to_string(), xsd::DECIMAL),
            Self::Float(value) => (value.to_string(), xsd::FLOAT),
            Self::Double(value) => (value.to_string(), xsd::DOUBLE),
        };
        Literal::new_typed_literal(value, datatype).into()
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Self::Integer(value) => f64::from(Double::from(value)),
            Self::Decimal(value) => f64::from(Double::from(value)),
            Self::Float(value) => f64::from(Double::from(value)),
            Self::Double(value) => f64::from(value),
        }
    }

    pub fn is_zero_or_nan(self) -> bool {
        match self {
            Self::Integer(value) => value == Integer::from(0),
            Self::Decimal(value) => value == Decimal::from(0),
            Self::Float(value) => value.is_nan() || value == Float::from(0.0),
            Self::Double(value) => value.is_nan() || value == Double::from(0.0),
        }
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => Self::Integer(lhs.checked_add(rhs)?),
            NumericPair::Decimal(lhs, rhs) => Self::Decimal(lhs.checked_add(rhs)?),
            NumericPair::Float(lhs, rhs) => Self::Float(lhs + rhs),
            NumericPair::Double(lhs, rhs) => Self::Double(lhs + rhs),
        })
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        Some(match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => Self::Integer(lhs.checked_sub(rhs)?),
            NumericPair::Decimal(lhs, rhs) => Self::Decimal(lhs.checked_sub(rhs)?),
            NumericPair::Float(lhs, rhs) => Self::Float(lhs - rhs),
            NumericPair::Double(lhs, rhs) => Self::Double(lhs - rhs),
        })
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        Some(match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => Self::Integer(lhs.checked_mul(rhs)?),
            NumericPair::Decimal(lhs, rhs) => Self::Decimal(lhs.checked_mul(rhs)?),
            NumericPair::Float(lhs, rhs) => Self::Float(lhs * rhs),
            NumericPair::Double(lhs, rhs) => Self::Double(lhs * rhs),
        })
    }

    /// Divides two numbers. The quotient of two integers is a decimal.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        Some(match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => {
                Self::Decimal(Decimal::from(lhs).checked_div(Decimal::from(rhs))?)
            }
            NumericPair::Decimal(lhs, rhs) => Self::Decimal(lhs.checked_div(rhs)?),
            NumericPair::Float(lhs, rhs) => Self::Float(lhs / rhs),
            NumericPair::Double(lhs, rhs) => Self::Double(lhs / rhs),
        })
    }

    pub fn checked_neg(self) -> Option<Self> {
        Some(match self {
            Self::Integer(value) => Self::Integer(value.checked_neg()?),
            Self::Decimal(value) => Self::Decimal(value.checked_neg()?),
            Self::Float(value) => Self::Float(-value),
            Self::Double(value) => Self::Double(-value),
        })
    }

    pub fn checked_abs(self) -> Option<Self> {
        Some(match self {
            Self::Integer(value) => Self::Integer(value.checked_abs()?),
            Self::Decimal(value) => Self::Decimal(value.checked_abs()?),
            Self::Float(value) => Self::Float(value.abs()),
            Self::Double(value) => Self::Double(value.abs()),
        })
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match NumericPair::with_casts_from(*self, *other) {
            NumericPair::Integer(lhs, rhs) => Some(lhs.cmp(&rhs)),
            NumericPair::Decimal(lhs, rhs) => Some(lhs.cmp(&rhs)),
            NumericPair::Float(lhs, rhs) => lhs.partial_cmp(&rhs),
            NumericPair::Double(lhs, rhs) => lhs.partial_cmp(&rhs),
        }
    }
}

/// Two numbers promoted to their common type.
pub enum NumericPair {
    Integer(Integer, Integer),
    Decimal(Decimal, Decimal),
    Float(Float, Float),
    Double(Double, Double),
}

impl NumericPair {
    pub fn with_casts_from(lhs: Numeric, rhs: Numeric) -> NumericPair {
        match (lhs, rhs) {
            (Numeric::Integer(lhs), Numeric::Integer(rhs)) => NumericPair::Integer(lhs, rhs),
            (Numeric::Integer(lhs), Numeric::Decimal(rhs)) => {
                NumericPair::Decimal(Decimal::from(lhs), rhs)
            }
            (Numeric::Integer(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs.into(), rhs),
            (Numeric::Integer(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs.into(), rhs),

            (Numeric::Decimal(lhs), Numeric::Integer(rhs)) => NumericPair::Decimal(lhs, rhs.into()),
            (Numeric::Decimal(lhs), Numeric::Decimal(rhs)) => NumericPair::Decimal(lhs, rhs),
            (Numeric::Decimal(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs.into(), rhs),
            (Numeric::Decimal(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs.into(), rhs),

            (Numeric::Float(lhs), Numeric::Integer(rhs)) => NumericPair::Float(lhs, rhs.into()),
            (Numeric::Float(lhs), Numeric::Decimal(rhs)) => NumericPair::Float(lhs, rhs.into()),
            (Numeric::Float(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs, rhs),
            (Numeric::Float(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs.into(), rhs),

            (Numeric::Double(lhs), Numeric::Integer(rhs)) => NumericPair::Double(lhs, rhs.into()),
            (Numeric::Double(lhs), Numeric::Decimal(rhs)) => NumericPair::Double(lhs, rhs.into()),
            (Numeric::Double(lhs), Numeric::Float(rhs)) => NumericPair::Double(lhs, rhs.into()),
            (Numeric::Double(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs, rhs),
        }
    }
}

fn is_integer_datatype(datatype: NamedNodeRef<'_>) -> bool {
    [
        xsd::INTEGER,
        xsd::INT,
        xsd::LONG,
        xsd::SHORT,
        xsd::BYTE,
        xsd::NON_NEGATIVE_INTEGER,
        xsd::POSITIVE_INTEGER,
        xsd::NON_POSITIVE_INTEGER,
        xsd::NEGATIVE_INTEGER,
        xsd::UNSIGNED_LONG,
        xsd::UNSIGNED_INT,
        xsd::UNSIGNED_SHORT,
        xsd::UNSIGNED_BYTE,
    ]
    .contains(&datatype)
}

/// Returns the lexical form of a simple literal or an `xsd:string`.
pub fn string_value(term: &Term) -> Option<&str> {
    match term {
        Term::Literal(literal) if literal.datatype() == xsd::STRING => Some(literal.value()),
        _ => None,
    }
}

/// Returns the lexical form and language of a string literal with or without language tag.
pub fn string_like(term: &Term) -> Option<(&str, Option<&str>)> {
    match term {
        Term::Literal(literal)
            if literal.datatype() == xsd::STRING || literal.datatype() == rdf::LANG_STRING =>
        {
            Some((literal.value(), literal.language()))
        }
        _ => None,
    }
}

pub fn boolean_value(term: &Term) -> Option<bool> {
    match term {
        Term::Literal(literal) if literal.datatype() == xsd::BOOLEAN => {
            Boolean::from_str(literal.value()).ok().map(bool::from)
        }
        _ => None,
    }
}

pub fn date_time_value(term: &Term) -> Option<DateTime> {
    match term {
        Term::Literal(literal) if literal.datatype() == xsd::DATE_TIME => {
            DateTime::from_str(literal.value()).ok()
        }
        _ => None,
    }
}

/// The effective boolean value of a term. [None] is a type error.
pub fn effective_boolean_value(term: &Term) -> Option<bool> {
    if let Some(value) = boolean_value(term) {
        return Some(value);
    }
    if let Some((value, _)) = string_like(term) {
        return Some(!value.is_empty());
    }
    Numeric::from_term(term).map(|value| !value.is_zero_or_nan())
}

/// Compares two terms by value. [None] if they are not comparable.
pub fn compare_terms(lhs: &Term, rhs: &Term) -> Option<Ordering> {
    if let (Some(lhs), Some(rhs)) = (Numeric::from_term(lhs), Numeric::from_term(rhs)) {
        return lhs.partial_cmp(&rhs);
    }
    if let (Some(lhs), Some(rhs)) = (string_value(lhs), string_value(rhs)) {
        return Some(lhs.cmp(rhs));
    }
    if let (Some(lhs), Some(rhs)) = (boolean_value(lhs), boolean_value(rhs)) {
        return Some(lhs.cmp(&rhs));
    }
    if let (Some(lhs), Some(rhs)) = (date_time_value(lhs), date_time_value(rhs)) {
        return lhs.partial_cmp(&rhs);
    }
    None
}

/// The `=` operator. [None] if the equality of two literals can not be decided.
pub fn equal_terms(lhs: &Term, rhs: &Term) -> Option<bool> {
    match (lhs, rhs) {
        (Term::Literal(lhs_literal), Term::Literal(rhs_literal)) => {
            if let Some(ordering) = compare_terms(lhs, rhs) {
                return Some(ordering == Ordering::Equal);
            }
            if lhs_literal == rhs_literal {
                return Some(true);
            }
            let decidable = (string_like(lhs).is_some() && string_like(rhs).is_some())
                || lhs_literal.datatype() == rhs_literal.datatype();
            decidable.then_some(false)
        }
        (lhs, rhs) => Some(lhs == rhs),
    }
}

/// Orders terms for `ORDER BY`: unbound first, then blank nodes, IRIs and literals.
pub fn order_terms(lhs: Option<&Term>, rhs: Option<&Term>) -> Ordering {
    fn rank(term: Option<&Term>) -> u8 {
        match term {
            None => 0,
            Some(Term::BlankNode(_)) => 1,
            Some(Term::NamedNode(_)) => 2,
            Some(Term::Literal(_)) => 3,
        }
    }
    match (lhs, rhs) {
        (Some(lhs @ Term::Literal(l)), Some(rhs @ Term::Literal(r))) => {
            compare_terms(lhs, rhs).unwrap_or_else(|| l.value().cmp(r.value()))
        }
        (Some(Term::NamedNode(l)), Some(Term::NamedNode(r))) => l.as_str().cmp(r.as_str()),
        (Some(Term::BlankNode(l)), Some(Term::BlankNode(r))) => l.as_str().cmp(r.as_str()),
        (lhs, rhs) => rank(lhs).cmp(&rank(rhs)),
    }
}
