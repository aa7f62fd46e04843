use crate::op::Op;
use parliament_common::error::QueryEvaluationError;
use parliament_common::QueryResult;
use parliament_model::{
    anonymous_variable, Binding, GraphPattern, GroundTerm, Term, TermPattern, TriplePattern,
};

impl Op {
    /// Converts a compiled SPARQL algebra tree into an [Op].
    ///
    /// Blank nodes in patterns become anonymous variables. Aggregation and federation are not
    /// supported.
    pub fn from_graph_pattern(pattern: &GraphPattern) -> QueryResult<Op> {
        Ok(match pattern {
            GraphPattern::Bgp { patterns } => Op::Bgp(patterns.iter().map(convert_triple).collect()),
            GraphPattern::Path {
                subject,
                path,
                object,
            } => Op::Path {
                subject: convert_term(subject),
                path: path.clone(),
                object: convert_term(object),
            },
            GraphPattern::Join { left, right } => Op::join(
                Self::from_graph_pattern(left)?,
                Self::from_graph_pattern(right)?,
            ),
            GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => Op::LeftJoin {
                left: Box::new(Self::from_graph_pattern(left)?),
                right: Box::new(Self::from_graph_pattern(right)?),
                expression: expression.clone(),
            },
            GraphPattern::Filter { expr, inner } => Op::Filter {
                expressions: vec![expr.clone()],
                inner: Box::new(Self::from_graph_pattern(inner)?),
            },
            GraphPattern::Union { left, right } => Op::union(
                Self::from_graph_pattern(left)?,
                Self::from_graph_pattern(right)?,
            ),
            GraphPattern::Minus { left, right } => Op::Minus {
                left: Box::new(Self::from_graph_pattern(left)?),
                right: Box::new(Self::from_graph_pattern(right)?),
            },
            GraphPattern::Graph { name, inner } => Op::Graph {
                name: name.clone(),
                inner: Box::new(Self::from_graph_pattern(inner)?),
            },
            GraphPattern::Extend {
                inner,
                variable,
                expression,
            } => Op::extend(
                Self::from_graph_pattern(inner)?,
                variable.clone(),
                expression.clone(),
            ),
            GraphPattern::Values {
                variables,
                bindings,
            } => Op::Table {
                variables: variables.clone(),
                rows: bindings
                    .iter()
                    .map(|row| {
                        variables
                            .iter()
                            .zip(row)
                            .filter_map(|(variable, value)| {
                                value
                                    .as_ref()
                                    .map(|value| (variable.clone(), ground_term(value)))
                            })
                            .collect::<Binding>()
                    })
                    .collect(),
            },
            GraphPattern::OrderBy { inner, expression } => Op::OrderBy {
                inner: Box::new(Self::from_graph_pattern(inner)?),
                expressions: expression.clone(),
            },
            GraphPattern::Project { inner, variables } => Op::Project {
                inner: Box::new(Self::from_graph_pattern(inner)?),
                variables: variables.clone(),
            },
            GraphPattern::Distinct { inner } => Op::Distinct {
                inner: Box::new(Self::from_graph_pattern(inner)?),
            },
            GraphPattern::Reduced { inner } => Op::Reduced {
                inner: Box::new(Self::from_graph_pattern(inner)?),
            },
            GraphPattern::Slice {
                inner,
                start,
                length,
            } => Op::Slice {
                inner: Box::new(Self::from_graph_pattern(inner)?),
                start: *start,
                length: *length,
            },
            pattern => {
                return Err(QueryEvaluationError::NotImplemented(format!(
                    "Unsupported graph pattern: {pattern}"
                )))
            }
        })
    }
}

fn convert_triple(pattern: &TriplePattern) -> TriplePattern {
    TriplePattern {
        subject: convert_term(&pattern.subject),
        predicate: pattern.predicate.clone(),
        object: convert_term(&pattern.object),
    }
}

fn convert_term(pattern: &TermPattern) -> TermPattern {
    match pattern {
        TermPattern::BlankNode(node) => anonymous_variable(node.as_str()).into(),
        pattern => pattern.clone(),
    }
}

fn ground_term(term: &GroundTerm) -> Term {
    match term {
        GroundTerm::NamedNode(node) => node.clone().into(),
        GroundTerm::Literal(literal) => literal.clone().into(),
    }
}
