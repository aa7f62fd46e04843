use parliament_model::Term;

/// The unit stored in an index: a node together with the value the index derived for it.
///
/// Keys are unique within an index.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<V> {
    pub key: Term,
    pub value: V,
}

impl<V> Record<V> {
    pub fn new(key: impl Into<Term>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
