use crate::test_utils::{create_index, interval, names};
use parliament_common::IndexResult;
use parliament_index::RelationalBinding;
use parliament_temporal::{TemporalExtent, TemporalIndex, TemporalRelation};

fn one() -> TemporalExtent {
    interval(1, 2)
}

fn two() -> TemporalExtent {
    interval(3, 4)
}

fn three() -> TemporalExtent {
    interval(2, 4)
}

fn four() -> TemporalExtent {
    interval(3, 7)
}

fn five() -> TemporalExtent {
    interval(4, 5)
}

fn six() -> TemporalExtent {
    interval(1, 2)
}

fn allen_index() -> IndexResult<TemporalIndex> {
    create_index(&[
        ("one", one()),
        ("two", two()),
        ("three", three()),
        ("four", four()),
        ("five", five()),
        ("six", six()),
    ])
}

#[test]
fn met_by_binds_either_argument() -> IndexResult<()> {
    let index = allen_index()?;
    let met_by = index.property_function(TemporalRelation::IntervalMetBy);

    assert_eq!(names(met_by.bind_first_var(&three())?), ["five"]);
    assert_eq!(names(met_by.bind_second_var(&three())?), ["one", "six"]);
    assert_eq!(met_by.estimate_first_var(&three())?, 1);
    assert_eq!(met_by.estimate_second_var(&three())?, 2);
    Ok(())
}

#[test]
fn overlapped_by_is_not_symmetric() -> IndexResult<()> {
    let index = allen_index()?;
    let overlapped_by = index.property_function(TemporalRelation::IntervalOverlappedBy);

    assert!(TemporalRelation::IntervalOverlappedBy.test(&four(), &three()));
    assert!(!TemporalRelation::IntervalOverlappedBy.test(&three(), &four()));
    assert_eq!(names(overlapped_by.bind_first_var(&three())?), ["four"]);
    assert!(names(overlapped_by.bind_first_var(&four())?).is_empty());
    assert_eq!(names(overlapped_by.bind_second_var(&four())?), ["three"]);
    Ok(())
}

#[test]
fn meets_uses_exact_boundaries() -> IndexResult<()> {
    let index = allen_index()?;
    let meets = index.property_function(TemporalRelation::IntervalMeets);

    assert_eq!(names(meets.bind_first_var(&three())?), ["one", "six"]);
    assert_eq!(names(meets.bind_second_var(&two())?), ["five"]);
    assert_eq!(names(meets.bind_second_var(&three())?), ["five"]);
    Ok(())
}

#[test]
fn containment_relations() -> IndexResult<()> {
    let index = allen_index()?;

    let during = index.property_function(TemporalRelation::IntervalDuring);
    assert_eq!(
        names(during.bind_first_var(&interval(1, 8))?),
        ["five", "four", "three", "two"]
    );

    let contains = index.property_function(TemporalRelation::IntervalContains);
    assert_eq!(names(contains.bind_first_var(&five())?), ["four"]);
    assert_eq!(names(contains.bind_second_var(&four())?), ["five"]);

    let equals = index.property_function(TemporalRelation::IntervalEquals);
    assert_eq!(names(equals.bind_first_var(&one())?), ["one", "six"]);

    let finishes = index.property_function(TemporalRelation::IntervalFinishes);
    assert_eq!(names(finishes.bind_first_var(&three())?), ["two"]);

    let starts = index.property_function(TemporalRelation::IntervalStarts);
    assert_eq!(names(starts.bind_first_var(&four())?), ["two"]);
    Ok(())
}

#[test]
fn before_and_after_are_inverses() -> IndexResult<()> {
    let index = allen_index()?;
    let before = index.property_function(TemporalRelation::IntervalBefore);
    let after = index.property_function(TemporalRelation::IntervalAfter);

    assert_eq!(names(before.bind_first_var(&five())?), ["one", "six"]);
    assert_eq!(names(after.bind_second_var(&five())?), ["one", "six"]);
    assert_eq!(names(after.bind_first_var(&one())?), ["five", "four", "two"]);
    Ok(())
}
