use crate::test_utils::{people, triple};
use parliament_common::error::QueryEvaluationError;
use parliament_common::{CancellationFlag, QueryResult};
use parliament_engine::{execute, ExecutionContext, QueryState, QueryTracker};
use parliament_logical::Op;

fn everything() -> Op {
    Op::bgp(vec![triple("s", "name", "n"), triple("x", "name", "y")])
}

#[test]
fn test_cancelled_query_does_not_start() {
    let table = people();
    let cancellation = CancellationFlag::new();
    cancellation.cancel();
    let context = ExecutionContext::new(&table).with_cancellation(cancellation);
    let op = everything();

    assert!(matches!(
        execute(&op, &context),
        Err(QueryEvaluationError::Cancelled)
    ));
}

#[test]
fn test_cancellation_stops_a_running_query() -> QueryResult<()> {
    let table = people();
    let tracker = QueryTracker::new();
    let handle = tracker.create("cross product of names");
    let context =
        ExecutionContext::new(&table).with_cancellation(handle.cancellation().clone());
    let op = everything();

    assert!(handle.start());
    let mut solutions = execute(&op, &context)?;
    assert!(solutions.next().transpose()?.is_some());
    assert!(tracker.cancel(handle.id()));

    assert!(matches!(
        solutions.next(),
        Some(Err(QueryEvaluationError::Cancelled))
    ));
    assert!(solutions.next().is_none());
    assert_eq!(handle.state(), QueryState::Cancelled);
    Ok(())
}
