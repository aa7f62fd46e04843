pub mod error;
mod cancellation;
mod source;

pub use cancellation::CancellationFlag;
pub use source::*;

use crate::error::{IndexError, QueryEvaluationError};
use parliament_model::Binding;
use std::collections::BTreeMap;

pub type IndexResult<T> = Result<T, IndexError>;
pub type QueryResult<T> = Result<T, QueryEvaluationError>;

/// A lazily evaluated sequence of solutions.
pub type BindingIter<'a> = Box<dyn Iterator<Item = QueryResult<Binding>> + 'a>;

/// Key/value configuration of an index factory.
pub type Properties = BTreeMap<String, String>;
