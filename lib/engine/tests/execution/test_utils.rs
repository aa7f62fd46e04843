use parliament_common::QueryResult;
use parliament_engine::{execute, ExecutionContext};
use parliament_logical::Op;
use parliament_model::{
    Expression, Literal, NamedNode, Term, TermPattern, Triple, TriplePattern, Variable,
};
use parliament_storage::TripleTable;

pub fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

pub fn iri(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://ex/{local}"))
}

pub fn var_expr(name: &str) -> Expression {
    Expression::Variable(var(name))
}

pub fn int_expr(value: i64) -> Expression {
    Expression::Literal(Literal::from(value))
}

/// A triple with variable subject and object, e.g., `triple("s", "name", "n")`.
pub fn triple(subject: &str, predicate: &str, object: &str) -> TriplePattern {
    triple_of(var(subject), predicate, var(object))
}

pub fn triple_of(
    subject: impl Into<TermPattern>,
    predicate: &str,
    object: impl Into<TermPattern>,
) -> TriplePattern {
    TriplePattern {
        subject: subject.into(),
        predicate: iri(predicate).into(),
        object: object.into(),
    }
}

fn fact(subject: &str, predicate: &str, object: impl Into<Term>) -> Triple {
    Triple::new(iri(subject), iri(predicate), object)
}

/// A small social graph:
///
/// `alice -knows-> bob -knows-> carol -knows-> dave`, with names for everyone and ages for all but
/// dave. Alice and carol are members of the team.
pub fn people() -> TripleTable {
    let mut table = TripleTable::new();
    for (person, name, age) in [
        ("alice", "Alice", Some(30)),
        ("bob", "Bob", Some(25)),
        ("carol", "Carol", Some(41)),
        ("dave", "Dave", None),
    ] {
        table.insert(fact(person, "name", Literal::new_simple_literal(name)));
        if let Some(age) = age {
            table.insert(fact(person, "age", Literal::from(age)));
        }
    }
    for (from, to) in [("alice", "bob"), ("bob", "carol"), ("carol", "dave")] {
        table.insert(fact(from, "knows", iri(to)));
    }
    for member in ["alice", "carol"] {
        table.insert(fact(member, "member", iri("team")));
    }
    table
}

/// Evaluates `op` and renders the solutions sorted, one per line.
pub fn run(op: &Op, context: &ExecutionContext<'_>) -> QueryResult<String> {
    let mut rows = execute(op, context)?
        .map(|solution| solution.map(|binding| binding.to_string()))
        .collect::<QueryResult<Vec<_>>>()?;
    rows.sort();
    Ok(rows.join("\n"))
}

/// Evaluates `op` and renders the solutions in the order they were produced.
pub fn run_ordered(op: &Op, context: &ExecutionContext<'_>) -> QueryResult<String> {
    let rows = execute(op, context)?
        .map(|solution| solution.map(|binding| binding.to_string()))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(rows.join("\n"))
}

/// Projects `op` to the given variables.
pub fn project(op: Op, variables: &[&str]) -> Op {
    Op::Project {
        inner: Box::new(op),
        variables: variables.iter().copied().map(var).collect(),
    }
}
