use parliament_common::IndexResult;
use parliament_index::{Index, Record, RecordIter};
use parliament_model::{NamedNode, Term};
use parliament_temporal::{parse_instant, TemporalExtent, TemporalIndex};

/// Midnight of the given day of January 2000.
pub fn january(day: u8) -> i64 {
    parse_instant(&format!("2000-01-{day:02}")).unwrap()
}

pub fn instant(day: u8) -> TemporalExtent {
    TemporalExtent::Instant(january(day))
}

pub fn interval(start: u8, end: u8) -> TemporalExtent {
    TemporalExtent::interval(january(start), january(end)).unwrap()
}

pub fn node(name: &str) -> Term {
    NamedNode::new_unchecked(format!("http://example.org/{name}")).into()
}

/// Creates an open index holding the given named extents.
pub fn create_index(extents: &[(&str, TemporalExtent)]) -> IndexResult<TemporalIndex> {
    let index = TemporalIndex::new();
    Index::open(&index)?;
    for (name, extent) in extents {
        index.add(Record::new(node(name), *extent))?;
    }
    Ok(index)
}

/// The sorted local names of the keys of `records`.
pub fn names(records: RecordIter<TemporalExtent>) -> Vec<String> {
    let mut names: Vec<_> = records
        .map(|record| match record.key {
            Term::NamedNode(node) => node
                .as_str()
                .trim_start_matches("http://example.org/")
                .to_owned(),
            other => other.to_string(),
        })
        .collect();
    names.sort();
    names
}
