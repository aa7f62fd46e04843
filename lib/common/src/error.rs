use datafusion_common::DataFusionError;
use std::convert::Infallible;
use std::error::Error;
use std::io;

/// An error related to storage operations (reads, writes...).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Error related to data corruption.
    #[error(transparent)]
    Corruption(#[from] CorruptionError),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl From<StorageError> for io::Error {
    #[inline]
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Io(error) => error,
            StorageError::Corruption(error) => error.into(),
            StorageError::Other(error) => Self::other(error),
        }
    }
}

/// An error return if some content in the database is corrupted.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct CorruptionError(#[from] CorruptionErrorKind);

/// An error return if some content in the database is corrupted.
#[derive(Debug, thiserror::Error)]
enum CorruptionErrorKind {
    #[error("{0}")]
    Msg(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl CorruptionError {
    /// Builds an error from a printable error message.
    #[inline]
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(CorruptionErrorKind::Other(error.into()))
    }

    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(CorruptionErrorKind::Msg(msg.into()))
    }
}

impl From<CorruptionError> for io::Error {
    #[inline]
    fn from(error: CorruptionError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}

/// The category of an [IndexError].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexErrorKind {
    OpenFailure,
    IoFailure,
    CorruptionDetected,
    ConfigurationInvalid,
    /// The operation is not allowed in the current lifecycle state of the index.
    State,
    /// The index does not support the operation, e.g., reporting its size cheaply.
    Unsupported,
}

/// An error raised by the lifecycle or mutator calls of a secondary index.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IndexError {
    #[error("Could not open index '{label}'")]
    Open {
        label: String,
        #[source]
        source: Box<dyn Error + Send + Sync + 'static>,
    },
    #[error("I/O failure in index '{label}'")]
    Io {
        label: String,
        #[source]
        source: io::Error,
    },
    #[error("Corrupted data in index '{label}'")]
    Corruption {
        label: String,
        #[source]
        source: CorruptionError,
    },
    #[error("Invalid index configuration: {0}")]
    ConfigurationInvalid(String),
    #[error(transparent)]
    State(#[from] IndexStateError),
    #[error("Index '{0}' does not support this operation")]
    Unsupported(String),
}

impl IndexError {
    pub fn kind(&self) -> IndexErrorKind {
        match self {
            Self::Open { .. } => IndexErrorKind::OpenFailure,
            Self::Io { .. } => IndexErrorKind::IoFailure,
            Self::Corruption { .. } => IndexErrorKind::CorruptionDetected,
            Self::ConfigurationInvalid(_) => IndexErrorKind::ConfigurationInvalid,
            Self::State(_) => IndexErrorKind::State,
            Self::Unsupported(_) => IndexErrorKind::Unsupported,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(msg.into())
    }

    /// Wraps an error of the persistence layer of the index labeled `label`.
    pub fn storage(label: impl Into<String>, error: StorageError) -> Self {
        let label = label.into();
        match error {
            StorageError::Io(source) => Self::Io { label, source },
            StorageError::Corruption(source) => Self::Corruption { label, source },
            StorageError::Other(source) => Self::Io {
                label,
                source: io::Error::other(source),
            },
        }
    }
}

impl From<Infallible> for IndexError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

/// An illegal lifecycle transition of an index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexStateError {
    #[error("Index '{0}' has not been opened")]
    NotOpen(String),
    #[error("Index '{0}' is closed")]
    Closed(String),
    #[error("Index '{0}' cannot be reopened after it was closed")]
    Reopen(String),
}

/// An error raised while evaluating a query.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryEvaluationError {
    /// An error from a secondary index.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// An error from the storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An expression could not be evaluated.
    #[error("Expression evaluation failed: {0}")]
    Expression(String),
    /// The algebra contains a construct the executor does not support.
    #[error("A feature has not yet been implemented: {0}")]
    NotImplemented(String),
    /// The operator tree could not be rewritten.
    #[error(transparent)]
    Rewrite(#[from] DataFusionError),
    /// The query was cancelled through its handle.
    #[error("The query was cancelled")]
    Cancelled,
    #[error("An internal error that likely indicates towards a bug in Parliament: {0}")]
    InternalError(String),
}

impl QueryEvaluationError {
    pub fn internal<T>(cause: String) -> Result<T, Self> {
        Err(QueryEvaluationError::InternalError(cause))
    }
}

impl From<IndexStateError> for QueryEvaluationError {
    #[inline]
    fn from(error: IndexStateError) -> Self {
        Self::Index(error.into())
    }
}

impl From<Infallible> for QueryEvaluationError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}
