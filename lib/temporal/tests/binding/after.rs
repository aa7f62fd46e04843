use crate::test_utils::{create_index, instant, interval, names};
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

fn mixed_index() -> IndexResult<TemporalIndex> {
    create_index(&[
        ("j1", instant(1)),
        ("j2", instant(2)),
        ("j3", instant(3)),
        ("j4", instant(4)),
        ("j5", instant(5)),
        ("j6", instant(6)),
        ("also_j6", instant(6)),
        ("one", one()),
        ("two", two()),
        ("three", three()),
        ("four", four()),
        ("five", five()),
        ("six", six()),
    ])
}

#[test]
fn after_binds_the_first_argument() -> IndexResult<()> {
    let index = mixed_index()?;
    let after = index.property_function(TemporalRelation::After);

    let expected = ["also_j6", "five", "four", "j3", "j4", "j5", "j6", "two"];
    assert_eq!(names(after.bind_first_var(&instant(2))?), expected);
    assert_eq!(names(after.bind_first_var(&one())?), expected);
    Ok(())
}

#[test]
fn after_binds_the_second_argument() -> IndexResult<()> {
    let index = mixed_index()?;
    let after = index.property_function(TemporalRelation::After);

    assert_eq!(
        names(after.bind_second_var(&instant(5))?),
        ["j1", "j2", "j3", "j4", "one", "six", "three", "two"]
    );
    assert_eq!(
        names(after.bind_second_var(&five())?),
        ["j1", "j2", "j3", "one", "six"]
    );
    Ok(())
}

#[test]
fn after_tests_mixed_extents() {
    let after = TemporalRelation::After;
    assert!(!after.test(&instant(6), &instant(6)));
    assert!(after.test(&instant(2), &instant(1)));
    assert!(after.test(&four(), &instant(1)));
    assert!(after.test(&instant(6), &three()));
    assert!(!after.test(&one(), &instant(3)));
    assert!(!after.test(&instant(1), &three()));
    assert!(after.test(&four(), &one()));
}

#[test]
fn instant_relations() -> IndexResult<()> {
    let index = mixed_index()?;

    let has_beginning = index.property_function(TemporalRelation::HasBeginning);
    assert_eq!(names(has_beginning.bind_first_var(&instant(3))?), ["four", "two"]);
    assert_eq!(names(has_beginning.bind_second_var(&four())?), ["j3"]);

    let has_end = index.property_function(TemporalRelation::HasEnd);
    assert_eq!(names(has_end.bind_first_var(&instant(4))?), ["three", "two"]);

    let inside = index.property_function(TemporalRelation::Inside);
    assert_eq!(
        names(inside.bind_second_var(&four())?),
        ["also_j6", "j4", "j5", "j6"]
    );
    assert_eq!(names(inside.bind_first_var(&instant(3))?), ["three"]);

    let equals = index.property_function(TemporalRelation::InstantEquals);
    assert_eq!(names(equals.bind_first_var(&instant(6))?), ["also_j6", "j6"]);
    assert!(names(equals.bind_first_var(&one())?).is_empty());
    Ok(())
}
