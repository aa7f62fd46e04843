//! Vocabularies used by the index-aware query core.

pub use oxrdf::vocab::{rdf, xsd};

/// The [Parliament time](http://bbn.com/ParliamentTime#) vocabulary.
pub mod pt {
    use oxrdf::NamedNodeRef;

    /// The namespace of the vocabulary.
    pub const NAMESPACE: &str = "http://bbn.com/ParliamentTime#";

    /// Links a resource to the instant it happened at.
    pub const AS_INSTANT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://bbn.com/ParliamentTime#asInstant");
    /// Links a resource to the interval it spans.
    pub const AS_INTERVAL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://bbn.com/ParliamentTime#asInterval");
    /// Datatype of interval literals of the form `"start,end"`.
    pub const INTERVAL_LITERAL: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://bbn.com/ParliamentTime#intervalLiteral");
}
