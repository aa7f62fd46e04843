use crate::test_utils::{iri, rewrite_with, triple};
use parliament_common::QueryResult;
use parliament_index::IndexSet;
use parliament_logical::rewrite::{
    IndexPropertyFunctionRule, PropertyFunctionRule, RewriteContext, Rewriter,
};
use parliament_logical::Op;
use std::sync::Arc;

fn context(functions: &[&str]) -> RewriteContext {
    RewriteContext::new(
        IndexSet::empty(),
        functions.iter().map(|function| (iri(function), Vec::new())),
    )
}

#[test]
fn test_call_consumes_preceding_triples() -> QueryResult<()> {
    let op = Op::bgp(vec![
        triple("s", "name", "n"),
        triple("s", "similar", "o"),
        triple("o", "label", "l"),
    ]);

    let rewriter = Rewriter::with_rules(vec![Arc::new(PropertyFunctionRule::new())]);
    let plan = rewriter.rewrite(op, &context(&["similar"]))?;
    insta::assert_snapshot!(plan, @r"
    Sequence
      PropFunc: ?s <http://ex/similar> ?o
        Bgp: ?s <http://ex/name> ?n
      Bgp: ?o <http://ex/label> ?l
    ");

    Ok(())
}

#[test]
fn test_unregistered_predicate_is_plain_triple() -> QueryResult<()> {
    let op = Op::bgp(vec![triple("s", "similar", "o")]);

    let plan = rewrite_with(op, vec![Arc::new(PropertyFunctionRule::new())])?;
    insta::assert_snapshot!(plan, @"Bgp: ?s <http://ex/similar> ?o");

    Ok(())
}

#[test]
fn test_consecutive_calls_nest() -> QueryResult<()> {
    let op = Op::bgp(vec![
        triple("s", "similar", "o"),
        triple("o", "similar", "p"),
    ]);

    let rewriter = Rewriter::with_rules(vec![Arc::new(PropertyFunctionRule::new())]);
    let plan = rewriter.rewrite(op, &context(&["similar"]))?;
    insta::assert_snapshot!(plan, @r"
    PropFunc: ?o <http://ex/similar> ?p
      PropFunc: ?s <http://ex/similar> ?o
        Table: unit
    ");

    Ok(())
}

#[test]
fn test_index_functions_need_indexes() -> QueryResult<()> {
    let op = Op::bgp(vec![triple("s", "similar", "o")]);

    let rewriter = Rewriter::with_rules(vec![Arc::new(IndexPropertyFunctionRule::new())]);
    let plan = rewriter.rewrite(op, &context(&[]))?;
    insta::assert_snapshot!(plan, @"Bgp: ?s <http://ex/similar> ?o");

    Ok(())
}

#[test]
fn test_argument_descriptions_move_into_the_call() -> QueryResult<()> {
    let op = Op::bgp(vec![
        triple("s", "name", "n"),
        triple("s", "during", "o"),
        triple("o", "interval", "i"),
    ]);
    let context = RewriteContext::new(IndexSet::empty(), [(iri("during"), vec![iri("interval")])]);

    let rewriter = Rewriter::with_rules(vec![Arc::new(PropertyFunctionRule::new())]);
    let plan = rewriter.rewrite(op, &context)?;
    insta::assert_snapshot!(plan, @r"
    PropFunc: ?s <http://ex/during> ?o | ?o <http://ex/interval> ?i
      Bgp: ?s <http://ex/name> ?n
    ");

    Ok(())
}
