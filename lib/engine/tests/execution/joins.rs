use crate::test_utils::{int_expr, iri, people, project, run, triple, triple_of, var, var_expr};
use parliament_common::{QueryResult, TripleSource};
use parliament_engine::{ExecutionContext, PropertyFunction, PropertyFunctionRegistry};
use parliament_logical::Op;
use parliament_model::{Binding, Expression, NamedNode, TermPattern, TriplePattern};
use std::sync::{Arc, Mutex};

#[test]
fn test_optional_keeps_unmatched_solutions() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::LeftJoin {
        left: Box::new(Op::bgp(vec![triple("p", "name", "n")])),
        right: Box::new(Op::bgp(vec![triple("p", "knows", "f")])),
        expression: None,
    };

    insta::assert_snapshot!(run(&project(op, &["n", "f"]), &context)?, @r#"
    {?f -> <http://ex/bob>, ?n -> "Alice"}
    {?f -> <http://ex/carol>, ?n -> "Bob"}
    {?f -> <http://ex/dave>, ?n -> "Carol"}
    {?n -> "Dave"}
    "#);
    Ok(())
}

#[test]
fn test_optional_with_filter() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::LeftJoin {
        left: Box::new(Op::bgp(vec![triple_of(var("p"), "member", iri("team"))])),
        right: Box::new(Op::bgp(vec![triple("p", "knows", "f")])),
        expression: Some(Expression::Equal(
            Box::new(var_expr("f")),
            Box::new(Expression::NamedNode(iri("bob"))),
        )),
    };

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?f -> <http://ex/bob>, ?p -> <http://ex/alice>}
    {?p -> <http://ex/carol>}
    ");
    Ok(())
}

#[test]
fn test_optional_that_can_not_be_streamed() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    // The filter of the right side refers to ?p, which only the left side binds.
    let right = Op::filter(
        vec![Expression::Equal(
            Box::new(var_expr("p")),
            Box::new(Expression::NamedNode(iri("alice"))),
        )],
        Op::bgp(vec![triple("f", "name", "n")]),
    );
    let op = Op::LeftJoin {
        left: Box::new(Op::bgp(vec![triple_of(var("p"), "member", iri("team"))])),
        right: Box::new(right),
        expression: None,
    };

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?p -> <http://ex/alice>}
    {?p -> <http://ex/carol>}
    ");
    Ok(())
}

#[test]
fn test_union_and_minus() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let union = Op::union(
        Op::bgp(vec![triple_of(var("p"), "knows", iri("bob"))]),
        Op::bgp(vec![triple_of(var("p"), "knows", iri("dave"))]),
    );
    let op = Op::Minus {
        left: Box::new(union),
        right: Box::new(Op::filter(
            vec![Expression::Greater(
                Box::new(var_expr("a")),
                Box::new(int_expr(40)),
            )],
            Op::bgp(vec![triple("p", "age", "a")]),
        )),
    };

    insta::assert_snapshot!(run(&op, &context)?, @"{?p -> <http://ex/alice>}");
    Ok(())
}

#[test]
fn test_minus_without_shared_variables_removes_nothing() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::Minus {
        left: Box::new(Op::bgp(vec![triple_of(var("p"), "member", iri("team"))])),
        right: Box::new(Op::bgp(vec![triple("x", "knows", "y")])),
    };

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?p -> <http://ex/alice>}
    {?p -> <http://ex/carol>}
    ");
    Ok(())
}

/// Records the solutions a property function is called with.
struct Recorder {
    uri: NamedNode,
    calls: Mutex<Vec<Binding>>,
}

impl PropertyFunction for Recorder {
    fn uri(&self) -> &NamedNode {
        &self.uri
    }

    fn execute(
        &self,
        _subject: &TermPattern,
        _object: &TermPattern,
        _described: &[TriplePattern],
        binding: &Binding,
        _source: &dyn TripleSource,
    ) -> QueryResult<Vec<Binding>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(binding.clone());
        }
        Ok(vec![binding.clone()])
    }
}

fn recorder_context<'a>(
    table: &'a parliament_storage::TripleTable,
    recorder: &Arc<Recorder>,
) -> ExecutionContext<'a> {
    let mut functions = PropertyFunctionRegistry::new();
    let function: Arc<dyn PropertyFunction> = Arc::<Recorder>::clone(recorder);
    functions.register(function);
    ExecutionContext::new(table).with_property_functions(functions)
}

fn recorder_call() -> Op {
    Op::PropFunc {
        uri: iri("recorder"),
        subject: var("p").into(),
        object: var("o").into(),
        pattern: Vec::new(),
        inner: Box::new(Op::unit()),
    }
}

#[test]
fn test_sequence_streams_solutions_into_the_right_side() -> QueryResult<()> {
    let table = people();
    let recorder = Arc::new(Recorder {
        uri: iri("recorder"),
        calls: Mutex::new(Vec::new()),
    });
    let context = recorder_context(&table, &recorder);
    let op = Op::Sequence(vec![
        Op::bgp(vec![triple_of(var("p"), "member", iri("team"))]),
        recorder_call(),
    ]);

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?p -> <http://ex/alice>}
    {?p -> <http://ex/carol>}
    ");
    let calls = recorder.calls.lock().map(|calls| calls.len()).unwrap_or_default();
    assert_eq!(calls, 2);
    assert!(recorder
        .calls
        .lock()
        .map(|calls| calls.iter().all(|call| call.contains(&var("p"))))
        .unwrap_or(false));
    Ok(())
}

#[test]
fn test_join_that_can_not_be_streamed_evaluates_sides_alone() -> QueryResult<()> {
    let table = people();
    let recorder = Arc::new(Recorder {
        uri: iri("recorder"),
        calls: Mutex::new(Vec::new()),
    });
    let context = recorder_context(&table, &recorder);
    let right = Op::Distinct {
        inner: Box::new(recorder_call()),
    };
    let op = Op::join(
        Op::bgp(vec![triple_of(var("p"), "member", iri("team"))]),
        right,
    );

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?p -> <http://ex/alice>}
    {?p -> <http://ex/carol>}
    ");
    let calls = recorder.calls.lock().map(|calls| calls.clone()).unwrap_or_default();
    assert_eq!(calls, vec![Binding::new()]);
    Ok(())
}
