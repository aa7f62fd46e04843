use crate::{Binding, NamedNodePattern, Term, TermPattern, Triple, TriplePattern, Variable};

/// An ordered conjunction of triple patterns.
///
/// The order matters for evaluation but not for the set of solutions.
pub type BasicPattern = Vec<TriplePattern>;

/// The prefix of variables that replace blank nodes in query patterns.
pub const ANONYMOUS_VARIABLE_PREFIX: &str = "_anon_";

/// Creates the variable that stands for the blank node labeled `label` in a query pattern.
pub fn anonymous_variable(label: &str) -> Variable {
    Variable::new_unchecked(format!("{ANONYMOUS_VARIABLE_PREFIX}{label}"))
}

/// Returns true if `variable` was introduced for a blank node and must not appear in results.
pub fn is_anonymous(variable: &Variable) -> bool {
    variable.as_str().starts_with(ANONYMOUS_VARIABLE_PREFIX)
}

pub fn term_pattern_variable(pattern: &TermPattern) -> Option<&Variable> {
    match pattern {
        TermPattern::Variable(variable) => Some(variable),
        _ => None,
    }
}

pub fn named_node_pattern_variable(pattern: &NamedNodePattern) -> Option<&Variable> {
    match pattern {
        NamedNodePattern::Variable(variable) => Some(variable),
        NamedNodePattern::NamedNode(_) => None,
    }
}

/// Returns the variables of `pattern` in subject, predicate, object order. Repeated variables are
/// returned once per occurrence.
pub fn triple_variables(pattern: &TriplePattern) -> impl Iterator<Item = &Variable> {
    term_pattern_variable(&pattern.subject)
        .into_iter()
        .chain(named_node_pattern_variable(&pattern.predicate))
        .chain(term_pattern_variable(&pattern.object))
}

/// Returns the distinct variables of `patterns` in order of first appearance.
pub fn pattern_variables(patterns: &[TriplePattern]) -> Vec<Variable> {
    let mut result: Vec<Variable> = Vec::new();
    for variable in patterns.iter().flat_map(triple_variables) {
        if !result.contains(variable) {
            result.push(variable.clone());
        }
    }
    result
}

/// Converts a ground term pattern into a term.
pub fn pattern_to_term(pattern: &TermPattern) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::BlankNode(node) => Some(node.clone().into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        _ => None,
    }
}

pub fn term_to_pattern(term: Term) -> TermPattern {
    match term {
        Term::NamedNode(node) => TermPattern::NamedNode(node),
        Term::BlankNode(node) => TermPattern::BlankNode(node),
        Term::Literal(literal) => TermPattern::Literal(literal),
    }
}

/// Replaces every variable of `pattern` that is bound in `binding` by its value.
pub fn substitute_term(pattern: &TermPattern, binding: &Binding) -> TermPattern {
    match pattern {
        TermPattern::Variable(variable) => match binding.get(variable) {
            Some(term) => term_to_pattern(term.clone()),
            None => pattern.clone(),
        },
        _ => pattern.clone(),
    }
}

pub fn substitute_triple(pattern: &TriplePattern, binding: &Binding) -> TriplePattern {
    let predicate = match &pattern.predicate {
        NamedNodePattern::Variable(variable) => match binding.get(variable) {
            Some(Term::NamedNode(node)) => NamedNodePattern::NamedNode(node.clone()),
            _ => pattern.predicate.clone(),
        },
        NamedNodePattern::NamedNode(_) => pattern.predicate.clone(),
    };
    TriplePattern {
        subject: substitute_term(&pattern.subject, binding),
        predicate,
        object: substitute_term(&pattern.object, binding),
    }
}

pub fn substitute_pattern(patterns: &[TriplePattern], binding: &Binding) -> BasicPattern {
    patterns
        .iter()
        .map(|pattern| substitute_triple(pattern, binding))
        .collect()
}

/// Matches `triple` against `pattern` and extends `binding` with the matched variables.
///
/// Returns [None] if a constant of the pattern differs from the triple, or if a variable occurs
/// several times and would be bound to different terms.
pub fn bind_triple(pattern: &TriplePattern, triple: &Triple, binding: &Binding) -> Option<Binding> {
    let mut result = binding.clone();
    bind_position(&pattern.subject, &Term::from(triple.subject.clone()), &mut result)?;
    match &pattern.predicate {
        NamedNodePattern::NamedNode(node) => {
            if node != &triple.predicate {
                return None;
            }
        }
        NamedNodePattern::Variable(variable) => {
            bind_variable(variable, &Term::from(triple.predicate.clone()), &mut result)?;
        }
    }
    bind_position(&pattern.object, &triple.object, &mut result)?;
    Some(result)
}

fn bind_position(pattern: &TermPattern, term: &Term, binding: &mut Binding) -> Option<()> {
    match pattern {
        TermPattern::Variable(variable) => bind_variable(variable, term, binding),
        _ => (pattern_to_term(pattern).as_ref() == Some(term)).then_some(()),
    }
}

fn bind_variable(variable: &Variable, term: &Term, binding: &mut Binding) -> Option<()> {
    match binding.get(variable) {
        Some(existing) => (existing == term).then_some(()),
        None => {
            binding.insert(variable.clone(), term.clone());
            Some(())
        }
    }
}
