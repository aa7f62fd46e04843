use itertools::Itertools;
use parliament_model::vocab::xsd;
use parliament_model::{
    Expression, Literal, NamedNodePattern, PropertyPathExpression, TermPattern, TriplePattern,
    Variable,
};
use std::fmt;

/// Formats an [Expression] the way it appears in plan listings.
///
/// Binary operators are always parenthesized and numeric or boolean literals are printed without
/// their datatype, e.g., `(?age >= 18)`.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionDisplay<'a>(pub &'a Expression);

impl fmt::Display for ExpressionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binary = |f: &mut fmt::Formatter<'_>, op: &str, lhs: &Expression, rhs: &Expression| {
            write!(
                f,
                "({} {op} {})",
                ExpressionDisplay(lhs),
                ExpressionDisplay(rhs)
            )
        };
        match self.0 {
            Expression::NamedNode(node) => write!(f, "{node}"),
            Expression::Literal(literal) => write!(f, "{}", LiteralDisplay(literal)),
            Expression::Variable(variable) => write!(f, "{variable}"),
            Expression::Or(lhs, rhs) => binary(f, "||", lhs, rhs),
            Expression::And(lhs, rhs) => binary(f, "&&", lhs, rhs),
            Expression::Equal(lhs, rhs) => binary(f, "=", lhs, rhs),
            Expression::Greater(lhs, rhs) => binary(f, ">", lhs, rhs),
            Expression::GreaterOrEqual(lhs, rhs) => binary(f, ">=", lhs, rhs),
            Expression::Less(lhs, rhs) => binary(f, "<", lhs, rhs),
            Expression::LessOrEqual(lhs, rhs) => binary(f, "<=", lhs, rhs),
            Expression::Add(lhs, rhs) => binary(f, "+", lhs, rhs),
            Expression::Subtract(lhs, rhs) => binary(f, "-", lhs, rhs),
            Expression::Multiply(lhs, rhs) => binary(f, "*", lhs, rhs),
            Expression::Divide(lhs, rhs) => binary(f, "/", lhs, rhs),
            Expression::SameTerm(lhs, rhs) => write!(
                f,
                "sameTerm({}, {})",
                ExpressionDisplay(lhs),
                ExpressionDisplay(rhs)
            ),
            Expression::In(lhs, list) => write!(
                f,
                "({} IN ({}))",
                ExpressionDisplay(lhs),
                list.iter().map(ExpressionDisplay).join(", ")
            ),
            Expression::UnaryPlus(inner) => write!(f, "+{}", ExpressionDisplay(inner)),
            Expression::UnaryMinus(inner) => write!(f, "-{}", ExpressionDisplay(inner)),
            Expression::Not(inner) => write!(f, "!{}", ExpressionDisplay(inner)),
            Expression::Exists(pattern) => write!(f, "EXISTS {{ {pattern} }}"),
            Expression::Bound(variable) => write!(f, "BOUND({variable})"),
            Expression::If(condition, then, otherwise) => write!(
                f,
                "IF({}, {}, {})",
                ExpressionDisplay(condition),
                ExpressionDisplay(then),
                ExpressionDisplay(otherwise)
            ),
            Expression::Coalesce(arguments) => write!(
                f,
                "COALESCE({})",
                arguments.iter().map(ExpressionDisplay).join(", ")
            ),
            Expression::FunctionCall(function, arguments) => write!(
                f,
                "{function}({})",
                arguments.iter().map(ExpressionDisplay).join(", ")
            ),
        }
    }
}

/// Prints numbers and booleans by their lexical form and everything else in N-Triples syntax.
pub(crate) struct LiteralDisplay<'a>(pub &'a Literal);

impl fmt::Display for LiteralDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let datatype = self.0.datatype();
        if [xsd::INTEGER, xsd::DECIMAL, xsd::DOUBLE, xsd::BOOLEAN].contains(&datatype) {
            f.write_str(self.0.value())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

pub(crate) struct TermPatternDisplay<'a>(pub &'a TermPattern);

impl fmt::Display for TermPatternDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            TermPattern::Literal(literal) => write!(f, "{}", LiteralDisplay(literal)),
            term => write!(f, "{term}"),
        }
    }
}

pub(crate) struct TripleDisplay<'a>(pub &'a TriplePattern);

impl fmt::Display for TripleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let predicate = match &self.0.predicate {
            NamedNodePattern::NamedNode(node) => node.to_string(),
            NamedNodePattern::Variable(variable) => variable.to_string(),
        };
        write!(
            f,
            "{} {predicate} {}",
            TermPatternDisplay(&self.0.subject),
            TermPatternDisplay(&self.0.object)
        )
    }
}

pub(crate) struct PathDisplay<'a>(pub &'a PropertyPathExpression);

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            PropertyPathExpression::NamedNode(node) => write!(f, "{node}"),
            PropertyPathExpression::Reverse(inner) => write!(f, "^{}", PathDisplay(inner)),
            PropertyPathExpression::Sequence(lhs, rhs) => {
                write!(f, "({} / {})", PathDisplay(lhs), PathDisplay(rhs))
            }
            PropertyPathExpression::Alternative(lhs, rhs) => {
                write!(f, "({} | {})", PathDisplay(lhs), PathDisplay(rhs))
            }
            PropertyPathExpression::ZeroOrMore(inner) => write!(f, "({})*", PathDisplay(inner)),
            PropertyPathExpression::OneOrMore(inner) => write!(f, "({})+", PathDisplay(inner)),
            PropertyPathExpression::ZeroOrOne(inner) => write!(f, "({})?", PathDisplay(inner)),
            PropertyPathExpression::NegatedPropertySet(nodes) => {
                write!(f, "!({})", nodes.iter().join(" | "))
            }
        }
    }
}

/// Returns the variables mentioned by `expression` in order of first appearance.
///
/// Returns [None] if the expression contains an `EXISTS` whose pattern may refer to any variable
/// in scope. Such expressions can not be moved safely.
pub fn expression_variables(expression: &Expression) -> Option<Vec<Variable>> {
    let mut variables = Vec::new();
    collect_variables(expression, &mut variables)?;
    Some(variables.into_iter().unique().collect())
}

fn collect_variables(expression: &Expression, variables: &mut Vec<Variable>) -> Option<()> {
    match expression {
        Expression::NamedNode(_) | Expression::Literal(_) => {}
        Expression::Variable(variable) | Expression::Bound(variable) => {
            variables.push(variable.clone());
        }
        Expression::Or(lhs, rhs)
        | Expression::And(lhs, rhs)
        | Expression::Equal(lhs, rhs)
        | Expression::SameTerm(lhs, rhs)
        | Expression::Greater(lhs, rhs)
        | Expression::GreaterOrEqual(lhs, rhs)
        | Expression::Less(lhs, rhs)
        | Expression::LessOrEqual(lhs, rhs)
        | Expression::Add(lhs, rhs)
        | Expression::Subtract(lhs, rhs)
        | Expression::Multiply(lhs, rhs)
        | Expression::Divide(lhs, rhs) => {
            collect_variables(lhs, variables)?;
            collect_variables(rhs, variables)?;
        }
        Expression::In(lhs, list) => {
            collect_variables(lhs, variables)?;
            for element in list {
                collect_variables(element, variables)?;
            }
        }
        Expression::UnaryPlus(inner) | Expression::UnaryMinus(inner) | Expression::Not(inner) => {
            collect_variables(inner, variables)?;
        }
        Expression::If(condition, then, otherwise) => {
            collect_variables(condition, variables)?;
            collect_variables(then, variables)?;
            collect_variables(otherwise, variables)?;
        }
        Expression::Coalesce(arguments) | Expression::FunctionCall(_, arguments) => {
            for argument in arguments {
                collect_variables(argument, variables)?;
            }
        }
        Expression::Exists(_) => return None,
    }
    Some(())
}

/// Returns true if `expression` is an IRI or a literal.
pub fn is_constant(expression: &Expression) -> bool {
    matches!(expression, Expression::NamedNode(_) | Expression::Literal(_))
}

/// Replaces every occurrence of `variable` in `expression` by `value`.
///
/// `BOUND(variable)` becomes `true`. Patterns nested in `EXISTS` are left untouched.
pub(crate) fn substitute_expression(
    expression: &Expression,
    variable: &Variable,
    value: &Expression,
) -> Expression {
    let sub = |inner: &Expression| Box::new(substitute_expression(inner, variable, value));
    let all = |list: &[Expression]| {
        list.iter()
            .map(|inner| substitute_expression(inner, variable, value))
            .collect::<Vec<_>>()
    };
    match expression {
        Expression::Variable(v) if v == variable => value.clone(),
        Expression::Bound(v) if v == variable => Expression::Literal(Literal::from(true)),
        Expression::NamedNode(_)
        | Expression::Literal(_)
        | Expression::Variable(_)
        | Expression::Bound(_)
        | Expression::Exists(_) => expression.clone(),
        Expression::Or(lhs, rhs) => Expression::Or(sub(lhs), sub(rhs)),
        Expression::And(lhs, rhs) => Expression::And(sub(lhs), sub(rhs)),
        Expression::Equal(lhs, rhs) => Expression::Equal(sub(lhs), sub(rhs)),
        Expression::SameTerm(lhs, rhs) => Expression::SameTerm(sub(lhs), sub(rhs)),
        Expression::Greater(lhs, rhs) => Expression::Greater(sub(lhs), sub(rhs)),
        Expression::GreaterOrEqual(lhs, rhs) => Expression::GreaterOrEqual(sub(lhs), sub(rhs)),
        Expression::Less(lhs, rhs) => Expression::Less(sub(lhs), sub(rhs)),
        Expression::LessOrEqual(lhs, rhs) => Expression::LessOrEqual(sub(lhs), sub(rhs)),
        Expression::Add(lhs, rhs) => Expression::Add(sub(lhs), sub(rhs)),
        Expression::Subtract(lhs, rhs) => Expression::Subtract(sub(lhs), sub(rhs)),
        Expression::Multiply(lhs, rhs) => Expression::Multiply(sub(lhs), sub(rhs)),
        Expression::Divide(lhs, rhs) => Expression::Divide(sub(lhs), sub(rhs)),
        Expression::In(lhs, list) => Expression::In(sub(lhs), all(list)),
        Expression::UnaryPlus(inner) => Expression::UnaryPlus(sub(inner)),
        Expression::UnaryMinus(inner) => Expression::UnaryMinus(sub(inner)),
        Expression::Not(inner) => Expression::Not(sub(inner)),
        Expression::If(condition, then, otherwise) => {
            Expression::If(sub(condition), sub(then), sub(otherwise))
        }
        Expression::Coalesce(arguments) => Expression::Coalesce(all(arguments)),
        Expression::FunctionCall(function, arguments) => {
            Expression::FunctionCall(function.clone(), all(arguments))
        }
    }
}

/// Splits nested `&&` into their operands.
pub(crate) fn conjuncts(expression: Expression) -> Vec<Expression> {
    match expression {
        Expression::And(lhs, rhs) => {
            let mut result = conjuncts(*lhs);
            result.extend(conjuncts(*rhs));
            result
        }
        expression => vec![expression],
    }
}

/// Splits nested `||` into their operands.
pub(crate) fn disjuncts(expression: &Expression) -> Vec<&Expression> {
    match expression {
        Expression::Or(lhs, rhs) => {
            let mut result = disjuncts(lhs);
            result.extend(disjuncts(rhs));
            result
        }
        expression => vec![expression],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parliament_model::{Function, NamedNode};

    fn var(name: &str) -> Expression {
        Expression::Variable(Variable::new_unchecked(name))
    }

    #[test]
    fn formats_nested_expressions() {
        let expression = Expression::And(
            Box::new(Expression::Less(
                Box::new(var("age")),
                Box::new(Expression::Literal(Literal::from(18))),
            )),
            Box::new(Expression::FunctionCall(
                Function::IsIri,
                vec![var("person")],
            )),
        );
        assert_eq!(
            ExpressionDisplay(&expression).to_string(),
            "((?age < 18) && isIRI(?person))"
        );
    }

    #[test]
    fn variables_are_reported_once() {
        let expression = Expression::Or(
            Box::new(Expression::Equal(
                Box::new(var("x")),
                Box::new(Expression::NamedNode(NamedNode::new_unchecked("http://ex/a"))),
            )),
            Box::new(Expression::Equal(Box::new(var("x")), Box::new(var("y")))),
        );
        assert_eq!(
            expression_variables(&expression),
            Some(vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")])
        );
    }

    #[test]
    fn substitution_replaces_bound() {
        let x = Variable::new_unchecked("x");
        let value = Expression::NamedNode(NamedNode::new_unchecked("http://ex/a"));
        let expression = Expression::And(
            Box::new(Expression::Bound(x.clone())),
            Box::new(Expression::SameTerm(Box::new(var("x")), Box::new(var("y")))),
        );
        assert_eq!(
            ExpressionDisplay(&substitute_expression(&expression, &x, &value)).to_string(),
            "(true && sameTerm(<http://ex/a>, ?y))"
        );
    }
}
