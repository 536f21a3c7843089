//! The bucket client seam.
//!
//! Everything hard — connection pooling, request batching, durability
//! quorums, query execution — lives behind [`BucketClient`]. The mapping
//! layer only marshals arguments, delegates, and translates errors.
//! [`InMemoryBucket`] is the bundled client for tests and development.

mod in_memory;

use std::fmt;

use crate::document::RawDocument;
use crate::durability::{PersistTo, ReplicateTo};
use crate::query::{N1qlQuery, QueryResult, ViewQuery, ViewResult};

/// Error type for bucket client operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    /// A create-only write hit an existing key.
    KeyExists { id: String },
    /// A replace or remove hit a missing key.
    KeyNotFound { id: String },
    /// The requested durability constraint exceeds the cluster topology.
    DurabilityImpossible {
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
        nodes: u32,
        replicas: u32,
    },
    /// A view query named a view that is not defined.
    UnknownView { design: String, view: String },
    /// The query engine rejected or failed the statement.
    QueryFailed(String),
    LockPoisoned(&'static str),
}

impl fmt::Display for BucketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketError::KeyExists { id } => write!(f, "key {} already exists", id),
            BucketError::KeyNotFound { id } => write!(f, "key {} not found", id),
            BucketError::DurabilityImpossible {
                persist_to,
                replicate_to,
                nodes,
                replicas,
            } => write!(
                f,
                "persist_to={:?} replicate_to={:?} exceeds topology of {} node(s), {} replica(s)",
                persist_to, replicate_to, nodes, replicas
            ),
            BucketError::UnknownView { design, view } => {
                write!(f, "unknown view {}/{}", design, view)
            }
            BucketError::QueryFailed(msg) => write!(f, "query failed: {}", msg),
            BucketError::LockPoisoned(operation) => {
                write!(f, "bucket lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for BucketError {}

/// Metadata about the cluster a bucket belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    /// Server version string.
    pub version: String,
    /// Number of nodes in the cluster.
    pub nodes: u32,
    /// Names of the buckets the cluster serves.
    pub buckets: Vec<String>,
}

/// A connection to a single document bucket.
///
/// Writes return the CAS token the store assigned to the mutation. Every
/// write takes the durability constraint pair; clients that cannot satisfy
/// a constraint fail with [`BucketError::DurabilityImpossible`] without
/// writing.
pub trait BucketClient: Send + Sync {
    /// The bucket's name.
    fn name(&self) -> &str;

    /// Fetch a document by key. Returns None if the key is absent.
    fn get(&self, id: &str) -> Result<Option<RawDocument>, BucketError>;

    /// Check whether a key is present.
    fn exists(&self, id: &str) -> Result<bool, BucketError>;

    /// Write a document unconditionally.
    fn upsert(
        &self,
        doc: RawDocument,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<u64, BucketError>;

    /// Write a document only if its key is absent.
    fn insert(
        &self,
        doc: RawDocument,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<u64, BucketError>;

    /// Write a document only if its key is present.
    fn replace(
        &self,
        doc: RawDocument,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<u64, BucketError>;

    /// Delete a document by key.
    fn remove(
        &self,
        id: &str,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), BucketError>;

    /// Execute a view query.
    fn query_view(&self, query: &ViewQuery) -> Result<ViewResult, BucketError>;

    /// Execute an N1QL-style query.
    fn query(&self, query: &N1qlQuery) -> Result<QueryResult, BucketError>;

    /// Metadata about the cluster this bucket belongs to.
    fn cluster_info(&self) -> Result<ClusterInfo, BucketError>;
}

pub use in_memory::{BucketConfig, InMemoryBucket, SnapshotDocument};
