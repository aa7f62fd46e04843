use crate::test_utils::{iri, rewrite_all, triple, var, var_expr};
use parliament_common::QueryResult;
use parliament_logical::Op;
use parliament_model::{Expression, GraphPattern, Literal, PropertyPathExpression};

#[test]
fn test_filter_over_join_is_placed_into_sequence() -> QueryResult<()> {
    let op = Op::filter(
        vec![Expression::Less(
            Box::new(var_expr("a")),
            Box::new(Expression::Literal(Literal::from(18))),
        )],
        Op::join(
            Op::bgp(vec![triple("s", "name", "n"), triple("s", "age", "a")]),
            Op::bgp(vec![triple("s", "knows", "f")]),
        ),
    );

    let plan = rewrite_all(op, &[])?;
    insta::assert_snapshot!(plan, @r"
    Sequence
      Filter: (?a < 18)
        Bgp: ?s <http://ex/name> ?n . ?s <http://ex/age> ?a
      Bgp: ?s <http://ex/knows> ?f
    ");

    Ok(())
}

#[test]
fn test_compiled_pattern_is_rewritten() -> QueryResult<()> {
    let knows = || Box::new(PropertyPathExpression::NamedNode(iri("knows")));
    let pattern = GraphPattern::Join {
        left: Box::new(GraphPattern::Bgp {
            patterns: vec![triple("s", "similar", "o")],
        }),
        right: Box::new(GraphPattern::Path {
            subject: var("o").into(),
            path: PropertyPathExpression::Sequence(knows(), knows()),
            object: var("f").into(),
        }),
    };

    let plan = rewrite_all(Op::from_graph_pattern(&pattern)?, &["similar"])?;
    insta::assert_snapshot!(plan, @r"
    Sequence
      PropFunc: ?s <http://ex/similar> ?o
        Table: unit
      Bgp: ?o <http://ex/knows> ?_anon_path0 . ?_anon_path0 <http://ex/knows> ?f
    ");

    Ok(())
}
