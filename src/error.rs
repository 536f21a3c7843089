use std::fmt;

use crate::bucket::BucketError;
use crate::convert::ConvertError;
use crate::durability::{PersistTo, ReplicateTo};

/// Error hierarchy surfaced by [`BucketOperations`](crate::BucketOperations).
///
/// Every failure of the underlying bucket client or the converter is
/// translated into one of these variants before it reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataAccessError {
    /// An insert hit a key that already exists.
    DocumentExists { id: String },
    /// An update or removal hit a key that does not exist.
    DocumentMissing { id: String },
    /// A write's durability constraint cannot be met by the cluster.
    Durability {
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
        nodes: u32,
        replicas: u32,
    },
    /// A query could not be executed or produced rows that cannot be
    /// mapped (e.g. missing `_ID`/`_CAS` metadata, reduced view rows).
    QueryExecution(String),
    /// Encoding or decoding a document failed.
    Conversion(ConvertError),
    /// Any other client failure, carried through untranslated.
    Client(BucketError),
}

impl fmt::Display for DataAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataAccessError::DocumentExists { id } => {
                write!(f, "document {} already exists", id)
            }
            DataAccessError::DocumentMissing { id } => {
                write!(f, "document {} does not exist", id)
            }
            DataAccessError::Durability {
                persist_to,
                replicate_to,
                nodes,
                replicas,
            } => write!(
                f,
                "durability constraint persist_to={:?} replicate_to={:?} cannot be met by {} node(s) with {} replica(s)",
                persist_to, replicate_to, nodes, replicas
            ),
            DataAccessError::QueryExecution(msg) => {
                write!(f, "query execution failed: {}", msg)
            }
            DataAccessError::Conversion(err) => write!(f, "{}", err),
            DataAccessError::Client(err) => write!(f, "bucket client error: {}", err),
        }
    }
}

impl std::error::Error for DataAccessError {}

impl From<BucketError> for DataAccessError {
    fn from(err: BucketError) -> Self {
        match err {
            BucketError::KeyExists { id } => DataAccessError::DocumentExists { id },
            BucketError::KeyNotFound { id } => DataAccessError::DocumentMissing { id },
            BucketError::DurabilityImpossible {
                persist_to,
                replicate_to,
                nodes,
                replicas,
            } => DataAccessError::Durability {
                persist_to,
                replicate_to,
                nodes,
                replicas,
            },
            BucketError::UnknownView { design, view } => DataAccessError::QueryExecution(
                format!("view {}/{} is not defined", design, view),
            ),
            BucketError::QueryFailed(msg) => DataAccessError::QueryExecution(msg),
            other => DataAccessError::Client(other),
        }
    }
}

impl From<ConvertError> for DataAccessError {
    fn from(err: ConvertError) -> Self {
        DataAccessError::Conversion(err)
    }
}
