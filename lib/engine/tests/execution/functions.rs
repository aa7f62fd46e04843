use crate::test_utils::{iri, people, project, run, triple, triple_of, var};
use parliament_common::{QueryResult, TripleSource};
use parliament_engine::{ExecutionContext, PropertyFunction, PropertyFunctionRegistry};
use parliament_logical::Op;
use parliament_model::{
    pattern_to_term, Binding, Literal, NamedNode, Term, TermPattern, TriplePattern,
};
use std::sync::Arc;

/// `?name ex:upper ?upper` binds the upper case form of a literal.
struct Upper {
    uri: NamedNode,
}

impl PropertyFunction for Upper {
    fn uri(&self) -> &NamedNode {
        &self.uri
    }

    fn execute(
        &self,
        subject: &TermPattern,
        object: &TermPattern,
        _described: &[TriplePattern],
        binding: &Binding,
        _source: &dyn TripleSource,
    ) -> QueryResult<Vec<Binding>> {
        let Some(Term::Literal(literal)) = pattern_to_term(subject) else {
            return Ok(Vec::new());
        };
        let upper: Term = Literal::new_simple_literal(literal.value().to_uppercase()).into();
        Ok(match object {
            TermPattern::Variable(variable) => vec![binding.extended(variable.clone(), upper)],
            object if pattern_to_term(object).as_ref() == Some(&upper) => vec![binding.clone()],
            _ => Vec::new(),
        })
    }
}

/// `?name ex:startsWith ?prefix` holds if the literal `?name` starts with the text given by
/// `?prefix ex:text "..."`.
struct StartsWith {
    uri: NamedNode,
    operand_predicates: [NamedNode; 1],
}

impl StartsWith {
    fn text<'t>(&self, argument: &TermPattern, described: &'t [TriplePattern]) -> Option<&'t str> {
        described.iter().find_map(|triple| match &triple.object {
            TermPattern::Literal(text) if triple.subject == *argument => Some(text.value()),
            _ => None,
        })
    }
}

impl PropertyFunction for StartsWith {
    fn uri(&self) -> &NamedNode {
        &self.uri
    }

    fn operand_predicates(&self) -> &[NamedNode] {
        &self.operand_predicates
    }

    fn described(
        &self,
        _subject: &TermPattern,
        object: &TermPattern,
        pattern: &[TriplePattern],
    ) -> Vec<TriplePattern> {
        pattern
            .iter()
            .filter(|triple| {
                triple.subject == *object && matches!(triple.object, TermPattern::Literal(_))
            })
            .cloned()
            .collect()
    }

    fn execute(
        &self,
        subject: &TermPattern,
        object: &TermPattern,
        described: &[TriplePattern],
        binding: &Binding,
        _source: &dyn TripleSource,
    ) -> QueryResult<Vec<Binding>> {
        let (Some(Term::Literal(name)), Some(prefix)) =
            (pattern_to_term(subject), self.text(object, described))
        else {
            return Ok(Vec::new());
        };
        Ok(if name.value().starts_with(prefix) {
            vec![binding.clone()]
        } else {
            Vec::new()
        })
    }
}

fn context_with_upper(table: &parliament_storage::TripleTable) -> ExecutionContext<'_> {
    let mut functions = PropertyFunctionRegistry::new();
    functions.register(Arc::new(Upper { uri: iri("upper") }));
    functions.register(Arc::new(StartsWith {
        uri: iri("startsWith"),
        operand_predicates: [iri("text")],
    }));
    ExecutionContext::new(table).with_property_functions(functions)
}

#[test]
fn test_property_function_is_called_per_solution() -> QueryResult<()> {
    let table = people();
    let context = context_with_upper(&table);
    let op = Op::PropFunc {
        uri: iri("upper"),
        subject: var("n").into(),
        object: var("u").into(),
        pattern: Vec::new(),
        inner: Box::new(Op::bgp(vec![
            triple_of(var("p"), "member", iri("team")),
            triple("p", "name", "n"),
        ])),
    };

    insta::assert_snapshot!(run(&project(op, &["u"]), &context)?, @r#"
    {?u -> "ALICE"}
    {?u -> "CAROL"}
    "#);
    Ok(())
}

#[test]
fn test_property_function_with_bound_object() -> QueryResult<()> {
    let table = people();
    let context = context_with_upper(&table);
    let op = Op::PropFunc {
        uri: iri("upper"),
        subject: var("n").into(),
        object: Literal::new_simple_literal("BOB").into(),
        pattern: Vec::new(),
        inner: Box::new(Op::bgp(vec![triple("p", "name", "n")])),
    };

    insta::assert_snapshot!(run(&project(op, &["p"]), &context)?, @"{?p -> <http://ex/bob>}");
    Ok(())
}

#[test]
fn test_unknown_property_function_is_a_triple_pattern() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::PropFunc {
        uri: iri("knows"),
        subject: iri("alice").into(),
        object: var("f").into(),
        pattern: Vec::new(),
        inner: Box::new(Op::unit()),
    };

    insta::assert_snapshot!(run(&op, &context)?, @"{?f -> <http://ex/bob>}");
    Ok(())
}

#[test]
fn test_index_function_without_index_uses_its_effective_form() -> QueryResult<()> {
    let table = people();
    let context = ExecutionContext::new(&table);
    let op = Op::IndexPropFunc {
        uri: iri("knows"),
        subject: var("p").into(),
        object: var("f").into(),
        pattern: vec![triple_of(var("p"), "member", iri("team"))],
        inner: Box::new(Op::unit()),
    };

    insta::assert_snapshot!(run(&op, &context)?, @r"
    {?f -> <http://ex/bob>, ?p -> <http://ex/alice>}
    {?f -> <http://ex/dave>, ?p -> <http://ex/carol>}
    ");
    Ok(())
}

#[test]
fn test_described_arguments_are_read_by_the_function() -> QueryResult<()> {
    let table = people();
    let context = context_with_upper(&table);
    let op = Op::PropFunc {
        uri: iri("startsWith"),
        subject: var("n").into(),
        object: var("prefix").into(),
        pattern: vec![
            triple_of(var("prefix"), "text", Literal::new_simple_literal("A")),
            triple_of(var("p"), "member", iri("team")),
        ],
        inner: Box::new(Op::bgp(vec![triple("p", "name", "n")])),
    };

    insta::assert_snapshot!(run(&project(op, &["p", "n"]), &context)?, @r#"{?n -> "Alice", ?p -> <http://ex/alice>}"#);
    Ok(())
}

#[test]
fn test_index_function_without_index_uses_a_generic_function() -> QueryResult<()> {
    let table = people();
    let context = context_with_upper(&table);
    let op = Op::IndexPropFunc {
        uri: iri("startsWith"),
        subject: var("n").into(),
        object: var("prefix").into(),
        pattern: vec![triple_of(var("prefix"), "text", Literal::new_simple_literal("C"))],
        inner: Box::new(Op::bgp(vec![triple("p", "name", "n")])),
    };

    insta::assert_snapshot!(run(&project(op, &["p"]), &context)?, @"{?p -> <http://ex/carol>}");
    Ok(())
}
