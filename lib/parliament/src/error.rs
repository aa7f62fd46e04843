use parliament_common::error::{IndexError, QueryEvaluationError};
use parliament_model::NamedNode;

/// An error raised by a [`Store`](crate::store::Store).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// An error of a secondary index while the store was updated.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// An error raised while evaluating a query.
    #[error(transparent)]
    Evaluation(#[from] QueryEvaluationError),
    #[error("The graph {0} does not exist")]
    UnknownGraph(NamedNode),
    #[error("The graph {0} already exists")]
    GraphExists(NamedNode),
}
