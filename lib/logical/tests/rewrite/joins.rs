use crate::test_utils::{rewrite_with, triple, var};
use parliament_common::QueryResult;
use parliament_logical::rewrite::JoinStrategyRule;
use parliament_logical::Op;
use parliament_model::Expression;
use std::sync::Arc;

#[test]
fn test_join_of_patterns_becomes_sequence() -> QueryResult<()> {
    let op = Op::join(
        Op::bgp(vec![triple("s", "name", "n")]),
        Op::bgp(vec![triple("s", "age", "a")]),
    );

    let plan = rewrite_with(op, vec![Arc::new(JoinStrategyRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Sequence
      Bgp: ?s <http://ex/name> ?n
      Bgp: ?s <http://ex/age> ?a
    ");

    Ok(())
}

#[test]
fn test_join_with_nested_scope_is_kept() -> QueryResult<()> {
    let op = Op::join(
        Op::bgp(vec![triple("s", "name", "n")]),
        Op::Distinct {
            inner: Box::new(Op::bgp(vec![triple("s", "age", "a")])),
        },
    );

    let plan = rewrite_with(op, vec![Arc::new(JoinStrategyRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Join
      Bgp: ?s <http://ex/name> ?n
      Distinct
        Bgp: ?s <http://ex/age> ?a
    ");

    Ok(())
}

#[test]
fn test_left_join_becomes_conditional() -> QueryResult<()> {
    let op = Op::LeftJoin {
        left: Box::new(Op::bgp(vec![triple("s", "name", "n")])),
        right: Box::new(Op::bgp(vec![triple("s", "email", "e")])),
        expression: Some(Expression::Bound(var("n"))),
    };

    let plan = rewrite_with(op, vec![Arc::new(JoinStrategyRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Conditional
      Bgp: ?s <http://ex/name> ?n
      Filter: BOUND(?n)
        Bgp: ?s <http://ex/email> ?e
    ");

    Ok(())
}

#[test]
fn test_optional_filter_on_outer_variable_is_kept() -> QueryResult<()> {
    // The right side filters on ?n, which only the left side binds.
    let right = Op::filter(
        vec![Expression::Bound(var("n"))],
        Op::bgp(vec![triple("s", "email", "e")]),
    );
    let op = Op::join(Op::bgp(vec![triple("s", "name", "n")]), right);

    let plan = rewrite_with(op, vec![Arc::new(JoinStrategyRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Join
      Bgp: ?s <http://ex/name> ?n
      Filter: BOUND(?n)
        Bgp: ?s <http://ex/email> ?e
    ");

    Ok(())
}
