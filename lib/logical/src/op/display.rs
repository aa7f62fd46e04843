use crate::op::expression::{PathDisplay, TermPatternDisplay, TripleDisplay};
use crate::op::{ExpressionDisplay, Op};
use itertools::Itertools;
use parliament_model::{NamedNodePattern, OrderExpression};
use std::fmt;

/// Prints the operator tree with one operator per line. Children are indented by two spaces.
impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}

impl Op {
    fn fmt_indent(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if depth > 0 {
            writeln!(f)?;
        }
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        self.fmt_node(f)?;
        for child in self.inputs() {
            child.fmt_indent(f, depth + 1)?;
        }
        Ok(())
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Bgp(pattern) if pattern.is_empty() => f.write_str("Bgp"),
            Op::Bgp(pattern) => write!(f, "Bgp: {}", pattern.iter().map(TripleDisplay).join(" . ")),
            Op::Path {
                subject,
                path,
                object,
            } => write!(
                f,
                "Path: {} {} {}",
                TermPatternDisplay(subject),
                PathDisplay(path),
                TermPatternDisplay(object)
            ),
            op if op.is_unit() => f.write_str("Table: unit"),
            Op::Table { variables, rows } => write!(
                f,
                "Table: {} rows={}",
                variables.iter().join(" "),
                rows.len()
            ),
            Op::Join { .. } => f.write_str("Join"),
            Op::Sequence(_) => f.write_str("Sequence"),
            Op::LeftJoin { expression, .. } => match expression {
                Some(expression) => write!(f, "LeftJoin: {}", ExpressionDisplay(expression)),
                None => f.write_str("LeftJoin"),
            },
            Op::Conditional { .. } => f.write_str("Conditional"),
            Op::Filter { expressions, .. } => write!(
                f,
                "Filter: {}",
                expressions.iter().map(ExpressionDisplay).join(", ")
            ),
            Op::Union { .. } => f.write_str("Union"),
            Op::Minus { .. } => f.write_str("Minus"),
            Op::Graph { name, .. } => match name {
                NamedNodePattern::NamedNode(node) => write!(f, "Graph: {node}"),
                NamedNodePattern::Variable(variable) => write!(f, "Graph: {variable}"),
            },
            Op::Extend {
                variable,
                expression,
                ..
            } => write!(f, "Extend: {variable} := {}", ExpressionDisplay(expression)),
            Op::PropFunc {
                uri,
                subject,
                object,
                pattern,
                ..
            }
            | Op::IndexPropFunc {
                uri,
                subject,
                object,
                pattern,
                ..
            } => {
                let name = if matches!(self, Op::PropFunc { .. }) {
                    "PropFunc"
                } else {
                    "IndexPropFunc"
                };
                write!(
                    f,
                    "{name}: {} {uri} {}",
                    TermPatternDisplay(subject),
                    TermPatternDisplay(object)
                )?;
                if !pattern.is_empty() {
                    write!(f, " | {}", pattern.iter().map(TripleDisplay).join(" . "))?;
                }
                Ok(())
            }
            Op::OrderBy { expressions, .. } => write!(
                f,
                "OrderBy: {}",
                expressions
                    .iter()
                    .map(|expression| match expression {
                        OrderExpression::Asc(inner) => format!("ASC({})", ExpressionDisplay(inner)),
                        OrderExpression::Desc(inner) =>
                            format!("DESC({})", ExpressionDisplay(inner)),
                    })
                    .join(" ")
            ),
            Op::Project { variables, .. } => write!(f, "Project: {}", variables.iter().join(" ")),
            Op::Distinct { .. } => f.write_str("Distinct"),
            Op::Reduced { .. } => f.write_str("Reduced"),
            Op::Slice { start, length, .. } => match length {
                Some(length) => write!(f, "Slice: start={start} length={length}"),
                None => write!(f, "Slice: start={start}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parliament_model::{Expression, Literal, NamedNode, TriplePattern, Variable};

    #[test]
    fn prints_indented_tree() {
        let triple = TriplePattern {
            subject: Variable::new_unchecked("s").into(),
            predicate: NamedNode::new_unchecked("http://ex/age").into(),
            object: Variable::new_unchecked("age").into(),
        };
        let op = Op::filter(
            vec![Expression::Less(
                Box::new(Expression::Variable(Variable::new_unchecked("age"))),
                Box::new(Expression::Literal(Literal::from(18))),
            )],
            Op::sequence(Op::bgp(vec![triple]), Op::unit()),
        );
        assert_eq!(
            op.to_string(),
            "Filter: (?age < 18)\n  Bgp: ?s <http://ex/age> ?age"
        );
    }
}
