use crate::test_utils::{people, project, run, run_ordered, triple, var, var_expr};
use parliament_common::QueryResult;
use parliament_engine::ExecutionContext;
use parliament_logical::Op;
use parliament_model::{Expression, Function, OrderExpression};

fn ages() -> Op {
    Op::bgp(vec![triple("p", "age", "a"), triple("p", "name", "n")])
}

#[test]
fn test_order_by_and_slice() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let ordered = Op::OrderBy {
        inner: Box::new(ages()),
        expressions: vec![OrderExpression::Desc(var_expr("a"))],
    };
    let op = Op::Slice {
        inner: Box::new(project(ordered, &["n"])),
        start: 1,
        length: Some(1),
    };

    insta::assert_snapshot!(run_ordered(&op, &context)?, @r#"{?n -> "Alice"}"#);
    Ok(())
}

#[test]
fn test_distinct_removes_duplicates() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let members = Op::bgp(vec![triple("p", "member", "t")]);
    let duplicated = project(Op::union(members.clone(), members), &["t"]);

    insta::assert_snapshot!(run(&duplicated.clone(), &context)?, @r"
    {?t -> <http://ex/team>}
    {?t -> <http://ex/team>}
    {?t -> <http://ex/team>}
    {?t -> <http://ex/team>}
    ");
    let op = Op::Distinct {
        inner: Box::new(duplicated),
    };
    insta::assert_snapshot!(run(&op, &context)?, @"{?t -> <http://ex/team>}");
    Ok(())
}

#[test]
fn test_extend_binds_computed_values() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::extend(
        Op::bgp(vec![triple("p", "name", "n")]),
        var("u"),
        Expression::FunctionCall(Function::UCase, vec![var_expr("n")]),
    );

    insta::assert_snapshot!(run(&project(op, &["u"]), &context)?, @r#"
    {?u -> "ALICE"}
    {?u -> "BOB"}
    {?u -> "CAROL"}
    {?u -> "DAVE"}
    "#);
    Ok(())
}

#[test]
fn test_extend_with_error_leaves_variable_unbound() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::extend(
        Op::bgp(vec![triple("p", "name", "n")]),
        var("u"),
        Expression::FunctionCall(Function::UCase, vec![var_expr("missing")]),
    );

    insta::assert_snapshot!(run(&project(op, &["n", "u"]), &context)?, @r#"
    {?n -> "Alice"}
    {?n -> "Bob"}
    {?n -> "Carol"}
    {?n -> "Dave"}
    "#);
    Ok(())
}

#[test]
fn test_table_rows_join_the_input() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let rows = Op::Table {
        variables: vec![var("n")],
        rows: vec![
            [(var("n"), parliament_model::Literal::new_simple_literal("Bob").into())]
                .into_iter()
                .collect(),
        ],
    };
    let op = Op::Sequence(vec![rows, Op::bgp(vec![triple("p", "name", "n")])]);

    insta::assert_snapshot!(run(&project(op, &["p"]), &context)?, @"{?p -> <http://ex/bob>}");
    Ok(())
}
