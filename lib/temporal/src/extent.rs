use parliament_common::error::CorruptionError;
use parliament_index::ValueCodec;
use parliament_model::vocab::{pt, xsd};
use parliament_model::Literal;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// An error raised while reading a temporal literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemporalParseError {
    #[error("Invalid date-time '{0}'")]
    InvalidDateTime(String),
    #[error("Invalid interval '{0}', expected 'start,end'")]
    InvalidInterval(String),
    #[error("The interval '{0}' does not end after it starts")]
    EmptyInterval(String),
    #[error("Literals of type <{0}> do not describe a temporal extent")]
    UnsupportedDatatype(String),
}

/// An instant or a half-open interval on the time line, in milliseconds since the Unix epoch.
///
/// An instant behaves like an extent whose start equals its end. An unbounded side of an
/// interval is represented by [i64::MIN] or [i64::MAX].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemporalExtent {
    Instant(i64),
    Interval { start: i64, end: i64 },
}

impl TemporalExtent {
    pub fn instant(millis: i64) -> Self {
        Self::Instant(millis)
    }

    /// Creates the interval `[start, end)`. Fails unless `start < end`.
    pub fn interval(start: i64, end: i64) -> Result<Self, TemporalParseError> {
        if start >= end {
            return Err(TemporalParseError::EmptyInterval(format!("{start},{end}")));
        }
        Ok(Self::Interval { start, end })
    }

    pub fn start(&self) -> i64 {
        match self {
            Self::Instant(millis) => *millis,
            Self::Interval { start, .. } => *start,
        }
    }

    pub fn end(&self) -> i64 {
        match self {
            Self::Instant(millis) => *millis,
            Self::Interval { end, .. } => *end,
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, Self::Instant(_))
    }

    pub fn is_interval(&self) -> bool {
        matches!(self, Self::Interval { .. })
    }

    /// Reads an `xsd:dateTime` (or `xsd:date`) literal as an instant and a `pt:intervalLiteral`
    /// as an interval.
    pub fn from_literal(literal: &Literal) -> Result<Self, TemporalParseError> {
        let datatype = literal.datatype();
        if datatype == xsd::DATE_TIME || datatype == xsd::DATE_TIME_STAMP || datatype == xsd::DATE
        {
            parse_instant(literal.value()).map(Self::Instant)
        } else if datatype == pt::INTERVAL_LITERAL {
            Self::parse_interval(literal.value())
        } else {
            Err(TemporalParseError::UnsupportedDatatype(
                datatype.as_str().to_owned(),
            ))
        }
    }

    /// Parses an interval literal of the form `start,end`. An empty side is unbounded.
    pub fn parse_interval(text: &str) -> Result<Self, TemporalParseError> {
        let Some((start, end)) = text.split_once(',') else {
            return Err(TemporalParseError::InvalidInterval(text.to_owned()));
        };
        if end.contains(',') {
            return Err(TemporalParseError::InvalidInterval(text.to_owned()));
        }
        let start = match start.trim() {
            "" => i64::MIN,
            start => parse_instant(start)?,
        };
        let end = match end.trim() {
            "" => i64::MAX,
            end => parse_instant(end)?,
        };
        Self::interval(start, end).map_err(|_| TemporalParseError::EmptyInterval(text.to_owned()))
    }

    /// The literal this extent is read from.
    pub fn to_literal(&self) -> Literal {
        match self {
            Self::Instant(_) => Literal::new_typed_literal(self.to_string(), xsd::DATE_TIME),
            Self::Interval { .. } => {
                Literal::new_typed_literal(self.to_string(), pt::INTERVAL_LITERAL)
            }
        }
    }
}

impl fmt::Display for TemporalExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(millis) => write_instant(f, *millis),
            Self::Interval { start, end } => {
                if *start != i64::MIN {
                    write_instant(f, *start)?;
                }
                f.write_str(",")?;
                if *end != i64::MAX {
                    write_instant(f, *end)?;
                }
                Ok(())
            }
        }
    }
}

fn write_instant(f: &mut fmt::Formatter<'_>, millis: i64) -> fmt::Result {
    let formatted = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|date_time| date_time.format(&Rfc3339).ok());
    match formatted {
        Some(formatted) => f.write_str(&formatted),
        None => write!(f, "{millis}"),
    }
}

/// Parses a date-time into milliseconds since the Unix epoch.
///
/// Accepts RFC 3339 date-times, date-times without an offset and plain dates. Values without an
/// offset are read as UTC. A plain date stands for its midnight.
pub fn parse_instant(text: &str) -> Result<i64, TemporalParseError> {
    let text = text.trim();
    let date_time = OffsetDateTime::parse(text, &Rfc3339)
        .or_else(|_| {
            PrimitiveDateTime::parse(
                text,
                format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
                ),
            )
            .map(PrimitiveDateTime::assume_utc)
        })
        .or_else(|_| {
            Date::parse(text, format_description!("[year]-[month]-[day]"))
                .map(|date| date.midnight().assume_utc())
        })
        .map_err(|_| TemporalParseError::InvalidDateTime(text.to_owned()))?;
    i64::try_from(date_time.unix_timestamp_nanos().div_euclid(1_000_000))
        .map_err(|_| TemporalParseError::InvalidDateTime(text.to_owned()))
}

/// Writes instants as `millis` and intervals as `start,end`.
pub(crate) struct ExtentCodec;

impl ValueCodec<TemporalExtent> for ExtentCodec {
    fn encode(&self, value: &TemporalExtent) -> String {
        match value {
            TemporalExtent::Instant(millis) => millis.to_string(),
            TemporalExtent::Interval { start, end } => format!("{start},{end}"),
        }
    }

    fn decode(&self, text: &str) -> Result<TemporalExtent, CorruptionError> {
        let millis = |text: &str| {
            text.parse::<i64>()
                .map_err(|error| CorruptionError::msg(format!("invalid instant '{text}': {error}")))
        };
        match text.split_once(',') {
            None => Ok(TemporalExtent::Instant(millis(text)?)),
            Some((start, end)) => TemporalExtent::interval(millis(start)?, millis(end)?)
                .map_err(|error| CorruptionError::msg(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_times_are_read_as_utc_millis() {
        assert_eq!(parse_instant("1970-01-01T00:00:01Z"), Ok(1000));
        assert_eq!(parse_instant("1970-01-01T00:00:01.5"), Ok(1500));
        assert_eq!(parse_instant("1970-01-01T01:00:00+01:00"), Ok(0));
        assert_eq!(parse_instant(" 1970-01-02 "), Ok(86_400_000));
        assert_eq!(parse_instant("1969-12-31T23:59:59.999Z"), Ok(-1));
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn interval_literals_may_be_open() -> Result<(), TemporalParseError> {
        let interval = TemporalExtent::parse_interval("1970-01-01, 1970-01-02")?;
        assert_eq!(interval, TemporalExtent::interval(0, 86_400_000)?);

        let open = TemporalExtent::parse_interval(",1970-01-02")?;
        assert_eq!(open.start(), i64::MIN);
        assert_eq!(open.to_string(), ",1970-01-02T00:00:00Z");
        assert_eq!(TemporalExtent::parse_interval(open.to_string().as_str())?, open);
        Ok(())
    }

    #[test]
    fn malformed_intervals_are_rejected() {
        assert_eq!(
            TemporalExtent::parse_interval("1970-01-02,1970-01-01"),
            Err(TemporalParseError::EmptyInterval(
                "1970-01-02,1970-01-01".to_owned()
            ))
        );
        assert!(matches!(
            TemporalExtent::parse_interval("1970-01-01"),
            Err(TemporalParseError::InvalidInterval(_))
        ));
        assert!(matches!(
            TemporalExtent::parse_interval("1970-01-01,,1970-01-02"),
            Err(TemporalParseError::InvalidInterval(_))
        ));
    }

    #[test]
    fn literals_are_read_by_datatype() -> Result<(), TemporalParseError> {
        let instant = Literal::new_typed_literal("1970-01-01T00:00:00Z", xsd::DATE_TIME);
        assert_eq!(TemporalExtent::from_literal(&instant)?, TemporalExtent::Instant(0));
        assert_eq!(TemporalExtent::Instant(0).to_literal(), instant);

        let plain = Literal::new_simple_literal("1970-01-01T00:00:00Z");
        assert!(matches!(
            TemporalExtent::from_literal(&plain),
            Err(TemporalParseError::UnsupportedDatatype(_))
        ));
        Ok(())
    }

    #[test]
    fn stored_values_are_decoded() -> Result<(), CorruptionError> {
        let interval = TemporalExtent::Interval { start: -5, end: 7 };
        assert_eq!(ExtentCodec.decode(&ExtentCodec.encode(&interval))?, interval);
        assert_eq!(ExtentCodec.decode("42")?, TemporalExtent::Instant(42));
        assert!(ExtentCodec.decode("7,-5").is_err());
        assert!(ExtentCodec.decode("noon").is_err());
        Ok(())
    }
}
