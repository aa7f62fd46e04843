use crate::{Term, Variable};
use std::fmt;

/// A solution mapping from variables to RDF terms.
///
/// The entries are kept sorted by variable name. Two bindings with the same content are therefore
/// equal and hash to the same value, regardless of the order in which variables were bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    entries: Vec<(Variable, Term)>,
}

impl Binding {
    /// Creates an empty [Binding].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the term bound to `variable`.
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.position(variable)
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Returns true if `variable` is bound.
    pub fn contains(&self, variable: &Variable) -> bool {
        self.position(variable).is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.entries.iter().map(|(v, t)| (v, t))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter().map(|(v, _)| v)
    }

    /// Binds `variable` to `term`, returning the previously bound term.
    pub fn insert(&mut self, variable: Variable, term: Term) -> Option<Term> {
        match self.position(&variable) {
            Ok(idx) => Some(std::mem::replace(&mut self.entries[idx].1, term)),
            Err(idx) => {
                self.entries.insert(idx, (variable, term));
                None
            }
        }
    }

    /// Removes the binding of `variable`.
    pub fn remove(&mut self, variable: &Variable) -> Option<Term> {
        self.position(variable)
            .ok()
            .map(|idx| self.entries.remove(idx).1)
    }

    /// Returns a copy of this binding that additionally binds `variable` to `term`.
    #[must_use]
    pub fn extended(&self, variable: Variable, term: Term) -> Self {
        let mut result = self.clone();
        result.insert(variable, term);
        result
    }

    /// Returns true if both bindings agree on all shared variables.
    pub fn is_compatible(&self, other: &Self) -> bool {
        other
            .iter()
            .all(|(v, t)| self.get(v).map_or(true, |own| own == t))
    }

    /// Merges two compatible bindings. Returns [None] if they disagree on a shared variable.
    pub fn merge(&self, other: &Self) -> Option<Self> {
        let mut result = self.clone();
        for (variable, term) in other.iter() {
            match result.get(variable) {
                Some(existing) if existing != term => return None,
                Some(_) => {}
                None => {
                    result.insert(variable.clone(), term.clone());
                }
            }
        }
        Some(result)
    }

    /// Restricts the binding to `variables`.
    #[must_use]
    pub fn project(&self, variables: &[Variable]) -> Self {
        self.entries
            .iter()
            .filter(|(v, _)| variables.contains(v))
            .cloned()
            .collect()
    }

    /// Drops all bindings of anonymous variables introduced for blank nodes.
    #[must_use]
    pub fn without_anonymous(&self) -> Self {
        self.entries
            .iter()
            .filter(|(v, _)| !crate::is_anonymous(v))
            .cloned()
            .collect()
    }

    fn position(&self, variable: &Variable) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(v, _)| v.as_str().cmp(variable.as_str()))
    }
}

impl FromIterator<(Variable, Term)> for Binding {
    fn from_iter<T: IntoIterator<Item = (Variable, Term)>>(iter: T) -> Self {
        let mut result = Self::new();
        for (variable, term) in iter {
            result.insert(variable, term);
        }
        result
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (variable, term)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable} -> {term}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NamedNode;

    #[test]
    fn insertion_order_does_not_matter() {
        let a: Binding = [(var("x"), iri("a")), (var("y"), iri("b"))]
            .into_iter()
            .collect();
        let b: Binding = [(var("y"), iri("b")), (var("x"), iri("a"))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "{?x -> <http://ex/a>, ?y -> <http://ex/b>}");
    }

    #[test]
    fn merge_rejects_conflicts() {
        let left = Binding::new().extended(var("x"), iri("a"));
        let same = Binding::new().extended(var("x"), iri("a"));
        let other = Binding::new().extended(var("x"), iri("b"));
        let disjoint = Binding::new().extended(var("y"), iri("b"));

        assert_eq!(left.merge(&same), Some(left.clone()));
        assert_eq!(left.merge(&other), None);
        assert!(!left.is_compatible(&other));
        assert_eq!(left.merge(&disjoint).map(|b| b.len()), Some(2));
    }

    #[test]
    fn project_keeps_requested_variables() {
        let binding = Binding::new()
            .extended(var("x"), iri("a"))
            .extended(var("y"), iri("b"));
        let projected = binding.project(&[var("y")]);
        assert!(!projected.contains(&var("x")));
        assert_eq!(projected.get(&var("y")), Some(&iri("b")));
    }

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn iri(name: &str) -> Term {
        NamedNode::new_unchecked(format!("http://ex/{name}")).into()
    }
}
