use crate::extent::TemporalExtent;
use parliament_index::{Record, RecordFactory};
use parliament_model::vocab::pt;
use parliament_model::{NamedNode, Term, Triple};

/// Creates temporal records from `pt:asInstant` and `pt:asInterval` triples.
///
/// The extent is read from the object literal according to its datatype. Triples with other
/// objects or malformed literals create no record.
#[derive(Debug, Clone)]
pub struct TemporalRecordFactory {
    predicates: [NamedNode; 2],
}

impl TemporalRecordFactory {
    pub fn new() -> Self {
        Self {
            predicates: [pt::AS_INSTANT.into_owned(), pt::AS_INTERVAL.into_owned()],
        }
    }
}

impl Default for TemporalRecordFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordFactory for TemporalRecordFactory {
    type Value = TemporalExtent;

    fn predicates(&self) -> &[NamedNode] {
        &self.predicates
    }

    fn create_record(&self, triple: &Triple) -> Option<Record<TemporalExtent>> {
        let Term::Literal(literal) = &triple.object else {
            return None;
        };
        match TemporalExtent::from_literal(literal) {
            Ok(extent) => Some(Record::new(triple.subject.clone(), extent)),
            Err(error) => {
                tracing::debug!(subject = %triple.subject, error = %error, "Ignoring temporal literal");
                None
            }
        }
    }
}
