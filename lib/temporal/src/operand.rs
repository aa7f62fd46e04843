use crate::extent::TemporalExtent;
use crate::index::TemporalInner;
use parliament_common::QueryResult;
use parliament_model::vocab::pt;
use parliament_model::{
    is_anonymous, pattern_to_term, NamedNodePattern, TermPattern, TriplePattern, Variable,
};

/// An argument of a temporal property function after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operand {
    Known(TemporalExtent),
    /// An unbound variable. Its values are taken from the index.
    Free(Variable),
    /// A term without an extent. The call has no solutions.
    Missing,
}

/// Resolves the argument `argument` of a call. Returns the triple of `pattern` that describes the
/// argument, if it was used.
///
/// A node is looked up in the index and a literal is read as an extent. A blank node of the query
/// whose extent is given in the pattern, e.g., `_:b pt:asInterval "..."`, stands for that extent and
/// is not matched against the index.
pub(crate) fn resolve(
    argument: &TermPattern,
    pattern: &[TriplePattern],
    inner: &TemporalInner,
) -> QueryResult<(Operand, Option<TriplePattern>)> {
    match argument {
        TermPattern::Variable(variable) => Ok(resolve_variable(variable, pattern)),
        TermPattern::Literal(literal) => Ok((
            TemporalExtent::from_literal(literal).map_or(Operand::Missing, Operand::Known),
            None,
        )),
        _ => {
            let Some(term) = pattern_to_term(argument) else {
                return Ok((Operand::Missing, None));
            };
            let operand = inner.find(&term)?.map_or(Operand::Missing, Operand::Known);
            Ok((operand, None))
        }
    }
}

pub(crate) fn resolve_variable(
    variable: &Variable,
    pattern: &[TriplePattern],
) -> (Operand, Option<TriplePattern>) {
    if is_anonymous(variable) {
        for triple in pattern {
            if let Some(extent) = described_extent(variable, triple) {
                return (Operand::Known(extent), Some(triple.clone()));
            }
        }
    }
    (Operand::Free(variable.clone()), None)
}

fn described_extent(variable: &Variable, triple: &TriplePattern) -> Option<TemporalExtent> {
    if !matches!(&triple.subject, TermPattern::Variable(subject) if subject == variable) {
        return None;
    }
    let NamedNodePattern::NamedNode(predicate) = &triple.predicate else {
        return None;
    };
    if predicate.as_ref() != pt::AS_INSTANT && predicate.as_ref() != pt::AS_INTERVAL {
        return None;
    }
    let TermPattern::Literal(literal) = &triple.object else {
        return None;
    };
    TemporalExtent::from_literal(literal).ok()
}
