use crate::test_utils::{iri, people, run, var};
use parliament_common::QueryResult;
use parliament_engine::ExecutionContext;
use parliament_logical::Op;
use parliament_model::{PropertyPathExpression, TermPattern};

fn path(
    subject: impl Into<TermPattern>,
    path: PropertyPathExpression,
    object: impl Into<TermPattern>,
) -> Op {
    Op::Path {
        subject: subject.into(),
        path,
        object: object.into(),
    }
}

fn knows() -> PropertyPathExpression {
    PropertyPathExpression::NamedNode(iri("knows"))
}

#[test]
fn test_one_or_more_from_a_start() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = path(
        iri("alice"),
        PropertyPathExpression::OneOrMore(Box::new(knows())),
        var("x"),
    );

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?x -> <http://ex/bob>}
    {?x -> <http://ex/carol>}
    {?x -> <http://ex/dave>}
    ");
    Ok(())
}

#[test]
fn test_zero_or_more_towards_an_end() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = path(
        var("x"),
        PropertyPathExpression::ZeroOrMore(Box::new(knows())),
        iri("carol"),
    );

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?x -> <http://ex/alice>}
    {?x -> <http://ex/bob>}
    {?x -> <http://ex/carol>}
    ");
    Ok(())
}

#[test]
fn test_zero_or_more_between_constants() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let connected = path(
        iri("alice"),
        PropertyPathExpression::ZeroOrMore(Box::new(knows())),
        iri("dave"),
    );
    let disconnected = path(
        iri("dave"),
        PropertyPathExpression::OneOrMore(Box::new(knows())),
        iri("alice"),
    );

    assert_eq!(run(&connected, &context)?, "{}");
    assert_eq!(run(&disconnected, &context)?, "");
    Ok(())
}

#[test]
fn test_reverse_sequence_and_alternative() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let reverse_sequence = path(
        iri("carol"),
        PropertyPathExpression::Sequence(
            Box::new(PropertyPathExpression::Reverse(Box::new(knows()))),
            Box::new(PropertyPathExpression::Reverse(Box::new(knows()))),
        ),
        var("x"),
    );
    let alternative = path(
        iri("alice"),
        PropertyPathExpression::Alternative(
            Box::new(knows()),
            Box::new(PropertyPathExpression::NamedNode(iri("member"))),
        ),
        var("x"),
    );

    insta::assert_snapshot!(run(&reverse_sequence, &context)?, @"{?x -> <http://ex/alice>}");
    insta::assert_snapshot!(run(&alternative, &context)?, @r"
    {?x -> <http://ex/bob>}
    {?x -> <http://ex/team>}
    ");
    Ok(())
}

#[test]
fn test_zero_or_one_and_negated_set() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let zero_or_one = path(
        iri("bob"),
        PropertyPathExpression::ZeroOrOne(Box::new(knows())),
        var("x"),
    );
    let negated = path(
        iri("alice"),
        PropertyPathExpression::NegatedPropertySet(vec![iri("name"), iri("age"), iri("knows")]),
        var("x"),
    );

    insta::assert_snapshot!(run(&zero_or_one, &context)?, @r"
    {?x -> <http://ex/bob>}
    {?x -> <http://ex/carol>}
    ");
    insta::assert_snapshot!(run(&negated, &context)?, @"{?x -> <http://ex/team>}");
    Ok(())
}

#[test]
fn test_path_with_both_ends_unbound() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = path(
        var("x"),
        PropertyPathExpression::OneOrMore(Box::new(PropertyPathExpression::NamedNode(iri(
            "member",
        )))),
        var("y"),
    );

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?x -> <http://ex/alice>, ?y -> <http://ex/team>}
    {?x -> <http://ex/carol>, ?y -> <http://ex/team>}
    ");
    Ok(())
}
