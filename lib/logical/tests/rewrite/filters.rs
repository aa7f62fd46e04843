use crate::test_utils::{eq, iri_expr, rewrite_with, triple, triple_of, var, var_expr};
use parliament_common::QueryResult;
use parliament_logical::rewrite::{
    ExpandOneOfRule, FilterConjunctionRule, FilterDisjunctionRule, FilterEqualityRule,
    FilterPlacementRule,
};
use parliament_logical::Op;
use parliament_model::{Expression, Literal};
use std::sync::Arc;

fn less_than(variable: &str, value: i32) -> Expression {
    Expression::Less(
        Box::new(var_expr(variable)),
        Box::new(Expression::Literal(Literal::from(value))),
    )
}

#[test]
fn test_conjunction_is_split() -> QueryResult<()> {
    let op = Op::filter(
        vec![Expression::And(
            Box::new(less_than("a", 18)),
            Box::new(Expression::Bound(var("n"))),
        )],
        Op::bgp(vec![triple("s", "age", "a")]),
    );

    let plan = rewrite_with(op, vec![Arc::new(FilterConjunctionRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Filter: (?a < 18), BOUND(?n)
      Bgp: ?s <http://ex/age> ?a
    ");

    Ok(())
}

#[test]
fn test_filter_is_placed_after_binding_triple() -> QueryResult<()> {
    let op = Op::filter(
        vec![less_than("a", 18)],
        Op::bgp(vec![
            triple("s", "name", "n"),
            triple("s", "age", "a"),
            triple("s", "knows", "f"),
        ]),
    );

    let plan = rewrite_with(op, vec![Arc::new(FilterPlacementRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Sequence
      Filter: (?a < 18)
        Bgp: ?s <http://ex/name> ?n . ?s <http://ex/age> ?a
      Bgp: ?s <http://ex/knows> ?f
    ");

    Ok(())
}

#[test]
fn test_filter_on_unbound_variable_stays_on_top() -> QueryResult<()> {
    let op = Op::filter(
        vec![less_than("x", 18)],
        Op::bgp(vec![triple("s", "name", "n"), triple("s", "age", "a")]),
    );

    let plan = rewrite_with(op, vec![Arc::new(FilterPlacementRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Filter: (?x < 18)
      Bgp: ?s <http://ex/name> ?n . ?s <http://ex/age> ?a
    ");

    Ok(())
}

#[test]
fn test_equality_substitutes_variable() -> QueryResult<()> {
    let op = Op::filter(
        vec![eq(var_expr("p"), iri_expr("alice")), less_than("a", 18)],
        Op::bgp(vec![triple("p", "name", "n"), triple("p", "age", "a")]),
    );

    let plan = rewrite_with(op, vec![Arc::new(FilterEqualityRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Filter: (?a < 18)
      Extend: ?p := <http://ex/alice>
        Bgp: <http://ex/alice> <http://ex/name> ?n . <http://ex/alice> <http://ex/age> ?a
    ");

    Ok(())
}

#[test]
fn test_equality_with_literal_is_kept() -> QueryResult<()> {
    let op = Op::filter(
        vec![eq(var_expr("n"), Expression::Literal(Literal::from("Alice")))],
        Op::bgp(vec![triple("p", "name", "n")]),
    );

    let plan = rewrite_with(op, vec![Arc::new(FilterEqualityRule::new())])?;
    insta::assert_snapshot!(plan, @r#"
    Filter: (?n = "Alice")
      Bgp: ?p <http://ex/name> ?n
    "#);

    Ok(())
}

#[test]
fn test_one_of_becomes_union() -> QueryResult<()> {
    let op = Op::filter(
        vec![Expression::In(
            Box::new(var_expr("p")),
            vec![iri_expr("alice"), iri_expr("bob")],
        )],
        Op::bgp(vec![triple("p", "name", "n")]),
    );

    let plan = rewrite_with(
        op,
        vec![
            Arc::new(ExpandOneOfRule::new()),
            Arc::new(FilterDisjunctionRule::new()),
        ],
    )?;
    insta::assert_snapshot!(plan, @r"
    Union
      Extend: ?p := <http://ex/alice>
        Bgp: <http://ex/alice> <http://ex/name> ?n
      Extend: ?p := <http://ex/bob>
        Bgp: <http://ex/bob> <http://ex/name> ?n
    ");

    Ok(())
}

#[test]
fn test_not_one_of_becomes_separate_filters() -> QueryResult<()> {
    let op = Op::filter(
        vec![Expression::Not(Box::new(Expression::In(
            Box::new(var_expr("p")),
            vec![iri_expr("alice"), iri_expr("bob")],
        )))],
        Op::bgp(vec![triple("p", "name", "n")]),
    );

    let plan = rewrite_with(op, vec![Arc::new(ExpandOneOfRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Filter: !(?p = <http://ex/alice>), !(?p = <http://ex/bob>)
      Bgp: ?p <http://ex/name> ?n
    ");

    Ok(())
}

#[test]
fn test_one_of_with_variables_is_kept() -> QueryResult<()> {
    let op = Op::filter(
        vec![Expression::In(
            Box::new(var_expr("p")),
            vec![iri_expr("alice"), var_expr("n")],
        )],
        Op::bgp(vec![triple("p", "name", "n")]),
    );

    let plan = rewrite_with(op, vec![Arc::new(ExpandOneOfRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Filter: (?p IN (<http://ex/alice>, ?n))
      Bgp: ?p <http://ex/name> ?n
    ");

    Ok(())
}

#[test]
fn test_disjunction_over_different_variables_is_kept() -> QueryResult<()> {
    let op = Op::filter(
        vec![Expression::Or(
            Box::new(eq(var_expr("p"), iri_expr("alice"))),
            Box::new(eq(var_expr("n"), iri_expr("bob"))),
        )],
        Op::bgp(vec![triple_of(var("p"), "knows", var("n"))]),
    );

    let plan = rewrite_with(op, vec![Arc::new(FilterDisjunctionRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Filter: ((?p = <http://ex/alice>) || (?n = <http://ex/bob>))
      Bgp: ?p <http://ex/knows> ?n
    ");

    Ok(())
}
