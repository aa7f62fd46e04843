//! Evaluation of SPARQL filter and `BIND` expressions.
//!
//! Expressions evaluate to `Ok(None)` on SPARQL errors, e.g., an unbound variable or a type error.
//! Filters treat such errors as false. Errors of the query itself, like a cancellation observed
//! while evaluating `EXISTS`, are returned as
//! [QueryEvaluationError](parliament_common::error::QueryEvaluationError).

mod value;

pub use value::{
    compare_terms, effective_boolean_value, equal_terms, order_terms, Numeric, NumericPair,
};

use oxsdatatypes::{DateTime, Decimal, Double, Float, Integer};
use parliament_common::QueryResult;
use parliament_model::vocab::xsd;
use parliament_model::{Binding, Expression, Function, GraphPattern, Literal, Term};
use std::cmp::Ordering;
use std::str::FromStr;
use value::{string_like, string_value};

/// Evaluates the `EXISTS` patterns of expressions.
pub trait ExistsEvaluator {
    /// Returns whether `pattern` has a solution compatible with `binding`.
    fn exists(&self, pattern: &GraphPattern, binding: &Binding) -> QueryResult<bool>;
}

/// Evaluates expressions against solutions.
#[derive(Clone, Copy)]
pub struct ExpressionEvaluator<'e> {
    exists: &'e dyn ExistsEvaluator,
}

impl<'e> ExpressionEvaluator<'e> {
    pub fn new(exists: &'e dyn ExistsEvaluator) -> Self {
        Self { exists }
    }

    /// Returns whether `binding` passes the filter `expression`.
    pub fn test(&self, expression: &Expression, binding: &Binding) -> QueryResult<bool> {
        Ok(self.effective_boolean_value(expression, binding)? == Some(true))
    }

    pub fn effective_boolean_value(
        &self,
        expression: &Expression,
        binding: &Binding,
    ) -> QueryResult<Option<bool>> {
        Ok(self
            .evaluate(expression, binding)?
            .as_ref()
            .and_then(effective_boolean_value))
    }

    pub fn evaluate(&self, expression: &Expression, binding: &Binding) -> QueryResult<Option<Term>> {
        Ok(match expression {
            Expression::NamedNode(node) => Some(node.clone().into()),
            Expression::Literal(literal) => Some(literal.clone().into()),
            Expression::Variable(variable) => binding.get(variable).cloned(),
            Expression::Or(lhs, rhs) => {
                let lhs = self.effective_boolean_value(lhs, binding)?;
                if lhs == Some(true) {
                    return Ok(Some(boolean(true)));
                }
                match (lhs, self.effective_boolean_value(rhs, binding)?) {
                    (_, Some(true)) => Some(boolean(true)),
                    (Some(false), Some(false)) => Some(boolean(false)),
                    _ => None,
                }
            }
            Expression::And(lhs, rhs) => {
                let lhs = self.effective_boolean_value(lhs, binding)?;
                if lhs == Some(false) {
                    return Ok(Some(boolean(false)));
                }
                match (lhs, self.effective_boolean_value(rhs, binding)?) {
                    (_, Some(false)) => Some(boolean(false)),
                    (Some(true), Some(true)) => Some(boolean(true)),
                    _ => None,
                }
            }
            Expression::Equal(lhs, rhs) => self
                .binary(lhs, rhs, binding)?
                .and_then(|(lhs, rhs)| equal_terms(&lhs, &rhs))
                .map(boolean),
            Expression::SameTerm(lhs, rhs) => self
                .binary(lhs, rhs, binding)?
                .map(|(lhs, rhs)| boolean(lhs == rhs)),
            Expression::Greater(lhs, rhs) => self.comparison(lhs, rhs, binding, Ordering::is_gt)?,
            Expression::GreaterOrEqual(lhs, rhs) => {
                self.comparison(lhs, rhs, binding, Ordering::is_ge)?
            }
            Expression::Less(lhs, rhs) => self.comparison(lhs, rhs, binding, Ordering::is_lt)?,
            Expression::LessOrEqual(lhs, rhs) => {
                self.comparison(lhs, rhs, binding, Ordering::is_le)?
            }
            Expression::In(lhs, list) => {
                let Some(lhs) = self.evaluate(lhs, binding)? else {
                    return Ok(None);
                };
                let mut error = false;
                for element in list {
                    match self
                        .evaluate(element, binding)?
                        .and_then(|element| equal_terms(&lhs, &element))
                    {
                        Some(true) => return Ok(Some(boolean(true))),
                        Some(false) => {}
                        None => error = true,
                    }
                }
                (!error).then(|| boolean(false))
            }
            Expression::Add(lhs, rhs) => self.arithmetic(lhs, rhs, binding, Numeric::checked_add)?,
            Expression::Subtract(lhs, rhs) => {
                self.arithmetic(lhs, rhs, binding, Numeric::checked_sub)?
            }
            Expression::Multiply(lhs, rhs) => {
                self.arithmetic(lhs, rhs, binding, Numeric::checked_mul)?
            }
            Expression::Divide(lhs, rhs) => {
                self.arithmetic(lhs, rhs, binding, Numeric::checked_div)?
            }
            Expression::UnaryPlus(inner) => self
                .numeric(inner, binding)?
                .map(Numeric::into_term),
            Expression::UnaryMinus(inner) => self
                .numeric(inner, binding)?
                .and_then(Numeric::checked_neg)
                .map(Numeric::into_term),
            Expression::Not(inner) => self
                .effective_boolean_value(inner, binding)?
                .map(|value| boolean(!value)),
            Expression::Exists(pattern) => Some(boolean(self.exists.exists(pattern, binding)?)),
            Expression::Bound(variable) => Some(boolean(binding.contains(variable))),
            Expression::If(condition, then, otherwise) => {
                match self.effective_boolean_value(condition, binding)? {
                    Some(true) => self.evaluate(then, binding)?,
                    Some(false) => self.evaluate(otherwise, binding)?,
                    None => None,
                }
            }
            Expression::Coalesce(arguments) => {
                for argument in arguments {
                    if let Some(value) = self.evaluate(argument, binding)? {
                        return Ok(Some(value));
                    }
                }
                None
            }
            Expression::FunctionCall(function, arguments) => {
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    match self.evaluate(argument, binding)? {
                        Some(value) => values.push(value),
                        None => return Ok(None),
                    }
                }
                call(function, &values)
            }
        })
    }

    fn binary(
        &self,
        lhs: &Expression,
        rhs: &Expression,
        binding: &Binding,
    ) -> QueryResult<Option<(Term, Term)>> {
        let Some(lhs) = self.evaluate(lhs, binding)? else {
            return Ok(None);
        };
        Ok(self.evaluate(rhs, binding)?.map(|rhs| (lhs, rhs)))
    }

    fn comparison(
        &self,
        lhs: &Expression,
        rhs: &Expression,
        binding: &Binding,
        accept: fn(Ordering) -> bool,
    ) -> QueryResult<Option<Term>> {
        Ok(self
            .binary(lhs, rhs, binding)?
            .and_then(|(lhs, rhs)| compare_terms(&lhs, &rhs))
            .map(|ordering| boolean(accept(ordering))))
    }

    fn numeric(&self, expression: &Expression, binding: &Binding) -> QueryResult<Option<Numeric>> {
        Ok(self
            .evaluate(expression, binding)?
            .as_ref()
            .and_then(Numeric::from_term))
    }

    fn arithmetic(
        &self,
        lhs: &Expression,
        rhs: &Expression,
        binding: &Binding,
        op: fn(Numeric, Numeric) -> Option<Numeric>,
    ) -> QueryResult<Option<Term>> {
        let Some(lhs) = self.numeric(lhs, binding)? else {
            return Ok(None);
        };
        Ok(self
            .numeric(rhs, binding)?
            .and_then(|rhs| op(lhs, rhs))
            .map(Numeric::into_term))
    }
}

fn boolean(value: bool) -> Term {
    Literal::from(value).into()
}

fn simple(value: impl Into<String>) -> Term {
    Literal::new_simple_literal(value).into()
}

/// A string literal with the given language tag, if any.
fn string_as(value: String, language: Option<&str>) -> Term {
    match language {
        Some(language) => Literal::new_language_tagged_literal_unchecked(value, language).into(),
        None => simple(value),
    }
}

fn call(function: &Function, arguments: &[Term]) -> Option<Term> {
    match (function, arguments) {
        (Function::Str, [Term::NamedNode(node)]) => Some(simple(node.as_str())),
        (Function::Str, [Term::Literal(literal)]) => Some(simple(literal.value())),
        (Function::Lang, [Term::Literal(literal)]) => {
            Some(simple(literal.language().unwrap_or_default()))
        }
        (Function::LangMatches, [tag, range]) => {
            let (tag, range) = (string_value(tag)?, string_value(range)?);
            let matches = if range == "*" {
                !tag.is_empty()
            } else {
                let tag = tag.to_ascii_lowercase();
                let range = range.to_ascii_lowercase();
                tag == range || tag.starts_with(&format!("{range}-"))
            };
            Some(boolean(matches))
        }
        (Function::Datatype, [Term::Literal(literal)]) => {
            Some(literal.datatype().into_owned().into())
        }
        (Function::StrLen, [value]) => {
            let (value, _) = string_like(value)?;
            let length = i64::try_from(value.chars().count()).ok()?;
            Some(Numeric::Integer(Integer::from(length)).into_term())
        }
        (Function::UCase, [value]) => {
            let (value, language) = string_like(value)?;
            Some(string_as(value.to_uppercase(), language))
        }
        (Function::LCase, [value]) => {
            let (value, language) = string_like(value)?;
            Some(string_as(value.to_lowercase(), language))
        }
        (Function::Contains, [value, pattern]) => {
            let ((value, _), (pattern, _)) = (string_like(value)?, string_like(pattern)?);
            Some(boolean(value.contains(pattern)))
        }
        (Function::StrStarts, [value, pattern]) => {
            let ((value, _), (pattern, _)) = (string_like(value)?, string_like(pattern)?);
            Some(boolean(value.starts_with(pattern)))
        }
        (Function::StrEnds, [value, pattern]) => {
            let ((value, _), (pattern, _)) = (string_like(value)?, string_like(pattern)?);
            Some(boolean(value.ends_with(pattern)))
        }
        (Function::StrBefore, [value, pattern]) => {
            let ((value, language), (pattern, _)) = (string_like(value)?, string_like(pattern)?);
            Some(match value.find(pattern) {
                Some(position) => string_as(value[..position].to_owned(), language),
                None => simple(""),
            })
        }
        (Function::StrAfter, [value, pattern]) => {
            let ((value, language), (pattern, _)) = (string_like(value)?, string_like(pattern)?);
            Some(match value.find(pattern) {
                Some(position) => {
                    string_as(value[position + pattern.len()..].to_owned(), language)
                }
                None => simple(""),
            })
        }
        (Function::Concat, values) => {
            let mut result = String::new();
            for value in values {
                result.push_str(string_like(value)?.0);
            }
            Some(simple(result))
        }
        (Function::IsIri, [value]) => Some(boolean(matches!(value, Term::NamedNode(_)))),
        (Function::IsBlank, [value]) => Some(boolean(matches!(value, Term::BlankNode(_)))),
        (Function::IsLiteral, [value]) => Some(boolean(matches!(value, Term::Literal(_)))),
        (Function::IsNumeric, [value]) => Some(boolean(Numeric::from_term(value).is_some())),
        (Function::Abs, [value]) => Numeric::from_term(value)?
            .checked_abs()
            .map(Numeric::into_term),
        (Function::Custom(datatype), [value]) => cast(datatype.as_ref(), value),
        _ => None,
    }
}

/// Casts `value` to the XSD datatype `datatype`.
fn cast(datatype: parliament_model::NamedNodeRef<'_>, value: &Term) -> Option<Term> {
    let lexical = match value {
        Term::NamedNode(node) if datatype == xsd::STRING => return Some(simple(node.as_str())),
        Term::Literal(literal) => literal.value(),
        _ => return None,
    };
    let numeric = Numeric::from_term(value);
    let typed = |value: String| Some(Literal::new_typed_literal(value, datatype).into());
    if datatype == xsd::STRING {
        Some(simple(lexical))
    } else if datatype == xsd::INTEGER {
        let value = match numeric {
            Some(Numeric::Integer(value)) => value,
            Some(Numeric::Decimal(value)) => Integer::try_from(value).ok()?,
            Some(Numeric::Float(value)) => Integer::try_from(value).ok()?,
            Some(Numeric::Double(value)) => Integer::try_from(value).ok()?,
            None => Integer::from_str(lexical).ok()?,
        };
        typed(value.to_string())
    } else if datatype == xsd::DECIMAL {
        let value = match numeric {
            Some(Numeric::Integer(value)) => Decimal::from(value),
            Some(Numeric::Decimal(value)) => value,
            Some(Numeric::Float(value)) => Decimal::try_from(value).ok()?,
            Some(Numeric::Double(value)) => Decimal::try_from(value).ok()?,
            None => Decimal::from_str(lexical).ok()?,
        };
        typed(value.to_string())
    } else if datatype == xsd::DOUBLE {
        let value = match numeric {
            Some(Numeric::Integer(value)) => Double::from(value),
            Some(Numeric::Decimal(value)) => Double::from(value),
            Some(Numeric::Float(value)) => Double::from(value),
            Some(Numeric::Double(value)) => value,
            None => Double::from_str(lexical).ok()?,
        };
        typed(value.to_string())
    } else if datatype == xsd::FLOAT {
        let value = match numeric {
            Some(Numeric::Integer(value)) => Float::from(value),
            Some(Numeric::Decimal(value)) => Float::from(value),
            Some(Numeric::Float(value)) => value,
            Some(Numeric::Double(value)) => Float::from(value),
            None => Float::from_str(lexical).ok()?,
        };
        typed(value.to_string())
    } else if datatype == xsd::BOOLEAN {
        let value = match numeric {
            Some(value) => !value.is_zero_or_nan(),
            None => match lexical {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return None,
            },
        };
        Some(boolean(value))
    } else if datatype == xsd::DATE_TIME {
        typed(DateTime::from_str(lexical).ok()?.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parliament_model::{NamedNode, Variable};

    struct NoExists;

    impl ExistsEvaluator for NoExists {
        fn exists(&self, _pattern: &GraphPattern, _binding: &Binding) -> QueryResult<bool> {
            Ok(false)
        }
    }

    fn var(name: &str) -> Box<Expression> {
        Box::new(Expression::Variable(Variable::new_unchecked(name)))
    }

    fn int(value: i64) -> Box<Expression> {
        Box::new(Expression::Literal(Literal::from(value)))
    }

    fn binding(value: i64) -> Binding {
        Binding::new().extended(Variable::new_unchecked("x"), Literal::from(value).into())
    }

    #[test]
    fn comparisons_use_values() -> QueryResult<()> {
        let evaluator = ExpressionEvaluator::new(&NoExists);
        let expression = Expression::Less(var("x"), int(10));
        assert!(evaluator.test(&expression, &binding(3))?);
        assert!(!evaluator.test(&expression, &binding(30))?);
        assert!(!evaluator.test(&expression, &Binding::new())?);
        Ok(())
    }

    #[test]
    fn or_recovers_from_errors() -> QueryResult<()> {
        let evaluator = ExpressionEvaluator::new(&NoExists);
        let expression = Expression::Or(
            Box::new(Expression::Less(var("unbound"), int(10))),
            Box::new(Expression::Less(var("x"), int(10))),
        );
        assert!(evaluator.test(&expression, &binding(3))?);

        let expression = Expression::And(
            Box::new(Expression::Less(var("unbound"), int(10))),
            Box::new(Expression::Less(var("x"), int(10))),
        );
        assert_eq!(evaluator.effective_boolean_value(&expression, &binding(3))?, None);
        Ok(())
    }

    #[test]
    fn arithmetic_and_functions() -> QueryResult<()> {
        let evaluator = ExpressionEvaluator::new(&NoExists);
        let sum = Expression::Add(var("x"), int(2));
        assert_eq!(
            evaluator.evaluate(&sum, &binding(3))?,
            Some(Literal::from(5).into())
        );

        let length = Expression::FunctionCall(
            Function::StrLen,
            vec![Expression::Literal(Literal::from("abc"))],
        );
        assert_eq!(
            evaluator.evaluate(&length, &Binding::new())?,
            Some(Literal::from(3).into())
        );

        let cast = Expression::FunctionCall(
            Function::Custom(NamedNode::from(xsd::INTEGER)),
            vec![Expression::Literal(Literal::from("42"))],
        );
        assert_eq!(
            evaluator.evaluate(&cast, &Binding::new())?,
            Some(Literal::from(42).into())
        );
        Ok(())
    }
}
