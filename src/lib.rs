mod bucket;
mod convert;
mod document;
mod durability;
#[cfg(feature = "emitter")]
pub mod emitter;
mod error;
mod operations;
mod query;
mod template;

pub use bucket::{
    BucketClient, BucketConfig, BucketError, ClusterInfo, InMemoryBucket, SnapshotDocument,
};
pub use convert::{ConvertError, DocumentConverter, JsonConverter};
pub use document::{Document, RawDocument};
pub use durability::{PersistTo, ReplicateTo};
#[cfg(feature = "emitter")]
pub use emitter::MutationEvents;
pub use error::DataAccessError;
pub use operations::{BucketOperations, SELECT_CAS, SELECT_ID};
pub use query::{N1qlQuery, QueryResult, QueryRow, ViewQuery, ViewResult, ViewRow};
pub use template::BucketTemplate;
