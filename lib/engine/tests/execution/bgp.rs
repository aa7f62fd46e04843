use crate::test_utils::{int_expr, iri, people, project, run, triple, triple_of, var, var_expr};
use parliament_common::QueryResult;
use parliament_engine::{ExecutionContext, QueryOptions};
use parliament_logical::Op;
use parliament_model::{Expression, Literal};

#[test]
fn test_chain_of_triples() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = project(
        Op::bgp(vec![
            triple("a", "knows", "b"),
            triple("b", "knows", "c"),
            triple("c", "name", "n"),
        ]),
        &["a", "n"],
    );

    insta::assert_snapshot!(run(&op, &context)?, @r#"
    {?a -> <http://ex/alice>, ?n -> "Carol"}
    {?a -> <http://ex/bob>, ?n -> "Dave"}
    "#);
    Ok(())
}

#[test]
fn test_constants_restrict_matches() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::bgp(vec![
        triple_of(var("p"), "member", iri("team")),
        triple("p", "name", "n"),
    ]);

    insta::assert_snapshot!(run(&project(op, &["n"]), &context)?, @r#"
    {?n -> "Alice"}
    {?n -> "Carol"}
    "#);
    Ok(())
}

#[test]
fn test_repeated_variable_must_match_twice() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::bgp(vec![triple("x", "knows", "x")]);

    assert_eq!(run(&op, &context)?, "");
    Ok(())
}

#[test]
fn test_empty_pattern_has_one_solution() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);

    assert_eq!(run(&Op::bgp(Vec::new()), &context)?, "{}");
    Ok(())
}

#[test]
fn test_optimization_does_not_change_results() -> QueryResult<()> {
    let table = people();
    let op = Op::Sequence(vec![
        Op::bgp(vec![triple_of(var("p"), "member", iri("team"))]),
        Op::bgp(vec![
            triple("p", "knows", "f"),
            triple("f", "name", "n"),
            triple("p", "age", "a"),
        ]),
    ]);

    let mut results = Vec::new();
    for (default_optimization, dynamic_optimization) in
        [(true, true), (true, false), (false, true), (false, false)]
    {
        let options = QueryOptions {
            default_optimization,
            dynamic_optimization,
            ..QueryOptions::default()
        };
        let context = ExecutionContext::new(&table).with_options(options);
        results.push(run(&project(op.clone(), &["p", "n"]), &context)?);
    }

    assert!(results.iter().all(|result| *result == results[0]));
    insta::assert_snapshot!(results[0], @r#"
    {?n -> "Bob", ?p -> <http://ex/alice>}
    {?n -> "Dave", ?p -> <http://ex/carol>}
    "#);
    Ok(())
}

#[test]
fn test_filters_are_applied_inside_the_pattern() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::filter(
        vec![
            Expression::Greater(Box::new(var_expr("a")), Box::new(int_expr(26))),
            Expression::Equal(
                Box::new(var_expr("n")),
                Box::new(Expression::Literal(Literal::new_simple_literal("Carol"))),
            ),
        ],
        Op::bgp(vec![triple("p", "age", "a"), triple("p", "name", "n")]),
    );

    insta::assert_snapshot!(run(&project(op, &["p"]), &context)?, @"{?p -> <http://ex/carol>}");
    Ok(())
}

#[test]
fn test_filter_on_unbound_variable_removes_everything() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::filter(
        vec![Expression::Bound(var("missing"))],
        Op::bgp(vec![triple("p", "name", "n")]),
    );

    assert_eq!(run(&op, &context)?, "");
    Ok(())
}
