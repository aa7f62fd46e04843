use crate::test_utils::{iri, rewrite_with, var};
use parliament_common::QueryResult;
use parliament_logical::rewrite::PathFlattenRule;
use parliament_logical::Op;
use parliament_model::PropertyPathExpression;
use std::sync::Arc;

fn path(path: PropertyPathExpression) -> Op {
    Op::Path {
        subject: var("s").into(),
        path,
        object: var("o").into(),
    }
}

fn step(local: &str) -> PropertyPathExpression {
    PropertyPathExpression::NamedNode(iri(local))
}

#[test]
fn test_sequence_becomes_triples() -> QueryResult<()> {
    let op = path(PropertyPathExpression::Sequence(
        Box::new(step("knows")),
        Box::new(PropertyPathExpression::Reverse(Box::new(step("member")))),
    ));

    let plan = rewrite_with(op, vec![Arc::new(PathFlattenRule::new())])?;
    insta::assert_snapshot!(plan, @"Bgp: ?s <http://ex/knows> ?_anon_path0 . ?o <http://ex/member> ?_anon_path0");

    Ok(())
}

#[test]
fn test_repetition_stays_path() -> QueryResult<()> {
    let op = path(PropertyPathExpression::Sequence(
        Box::new(step("knows")),
        Box::new(PropertyPathExpression::ZeroOrMore(Box::new(step("parent")))),
    ));

    let plan = rewrite_with(op, vec![Arc::new(PathFlattenRule::new())])?;
    insta::assert_snapshot!(plan, @r"
    Sequence
      Bgp: ?s <http://ex/knows> ?_anon_path0
      Path: ?_anon_path0 (<http://ex/parent>)* ?o
    ");

    Ok(())
}

#[test]
fn test_alternative_is_kept() -> QueryResult<()> {
    let op = path(PropertyPathExpression::Alternative(
        Box::new(step("knows")),
        Box::new(step("likes")),
    ));

    let plan = rewrite_with(op, vec![Arc::new(PathFlattenRule::new())])?;
    insta::assert_snapshot!(plan, @"Path: ?s (<http://ex/knows> | <http://ex/likes>) ?o");

    Ok(())
}
