//! Data model of the Parliament query core.
//!
//! RDF terms and triples are taken from [oxrdf](https://docs.rs/oxrdf), the input algebra from
//! [spargebra](https://docs.rs/spargebra). On top of these, this crate defines the [Binding]
//! solution mapping that flows between operators and a few helpers on basic graph patterns.

mod binding;
mod pattern;
pub mod vocab;

pub use binding::*;
pub use pattern::*;

// Re-export some oxrdf types.
pub use oxrdf::{
    BlankNode, BlankNodeRef, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef,
    Subject, SubjectRef, Term, TermParseError, TermRef, Triple, TripleRef, Variable,
    VariableRef,
};

// Re-export the spargebra algebra.
pub use spargebra::algebra::{
    Expression, Function, GraphPattern, OrderExpression, PropertyPathExpression,
};
pub use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};
