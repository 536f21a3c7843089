use serde::de::DeserializeOwned;

use crate::bucket::{BucketClient, BucketError, ClusterInfo};
use crate::convert::DocumentConverter;
use crate::document::Document;
use crate::durability::{PersistTo, ReplicateTo};
use crate::error::DataAccessError;
use crate::query::{N1qlQuery, QueryResult, ViewQuery, ViewResult};

/// Alias under which N1QL queries must project the document id
/// (`META(bucket).id AS _ID`) for [`BucketOperations::find_by_query`].
pub const SELECT_ID: &str = "_ID";

/// Alias under which N1QL queries must project the document CAS
/// (`META(bucket).cas AS _CAS`) for [`BucketOperations::find_by_query`].
pub const SELECT_CAS: &str = "_CAS";

/// Common operations on a document bucket, implemented by
/// [`BucketTemplate`](crate::BucketTemplate).
///
/// Convenience forms without durability arguments delegate to their
/// `_with` counterpart using [`PersistTo::None`] and [`ReplicateTo::None`].
/// Batch writes delegate per element and stop at the first failure,
/// leaving earlier writes in place.
pub trait BucketOperations {
    type Client: BucketClient;
    type Converter: DocumentConverter;

    /// Save the given entity under its id, subject to the durability
    /// constraints.
    ///
    /// When a document with the same id already exists it is overwritten,
    /// otherwise it is created.
    fn save_with<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Save the given entity under its id.
    fn save<T: Document>(&self, entity: &T) -> Result<(), DataAccessError> {
        self.save_with(entity, PersistTo::None, ReplicateTo::None)
    }

    /// Save a batch of entities, subject to the durability constraints.
    fn save_all_with<T: Document>(
        &self,
        batch: &[T],
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Save a batch of entities.
    fn save_all<T: Document>(&self, batch: &[T]) -> Result<(), DataAccessError> {
        self.save_all_with(batch, PersistTo::None, ReplicateTo::None)
    }

    /// Insert the given entity, subject to the durability constraints.
    ///
    /// Fails with [`DataAccessError::DocumentExists`] when a document with
    /// the same id is already present; use [`BucketOperations::save`] to
    /// overwrite.
    fn insert_with<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Insert the given entity.
    fn insert<T: Document>(&self, entity: &T) -> Result<(), DataAccessError> {
        self.insert_with(entity, PersistTo::None, ReplicateTo::None)
    }

    /// Insert a batch of entities, subject to the durability constraints.
    fn insert_all_with<T: Document>(
        &self,
        batch: &[T],
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Insert a batch of entities.
    fn insert_all<T: Document>(&self, batch: &[T]) -> Result<(), DataAccessError> {
        self.insert_all_with(batch, PersistTo::None, ReplicateTo::None)
    }

    /// Update the given entity, subject to the durability constraints.
    ///
    /// Fails with [`DataAccessError::DocumentMissing`] when no document
    /// with the entity's id exists; it is never created. Use
    /// [`BucketOperations::save`] for that.
    fn update_with<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Update the given entity.
    fn update<T: Document>(&self, entity: &T) -> Result<(), DataAccessError> {
        self.update_with(entity, PersistTo::None, ReplicateTo::None)
    }

    /// Update a batch of entities, subject to the durability constraints.
    fn update_all_with<T: Document>(
        &self,
        batch: &[T],
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Update a batch of entities.
    fn update_all<T: Document>(&self, batch: &[T]) -> Result<(), DataAccessError> {
        self.update_all_with(batch, PersistTo::None, ReplicateTo::None)
    }

    /// Find a document by its id and map it to an entity. Returns
    /// `Ok(None)` when the id is absent.
    fn find_by_id<T: Document>(&self, id: &str) -> Result<Option<T>, DataAccessError>;

    /// Query a view and map each row's document to an entity.
    ///
    /// The emitting document is fetched for every row, so there is no need
    /// to ask for included documents. Reduced views cannot be mapped this
    /// way (their rows reference no document) and fail with
    /// [`DataAccessError::QueryExecution`]; use
    /// [`BucketOperations::query_view`] for them.
    fn find_by_view<T: Document>(&self, query: &ViewQuery) -> Result<Vec<T>, DataAccessError>;

    /// Query a view with direct access to the raw [`ViewResult`], errors
    /// still translated. The path for reduced views.
    fn query_view(&self, query: &ViewQuery) -> Result<ViewResult, DataAccessError>;

    /// Run an N1QL query and map each row to an entity.
    ///
    /// Enough data to reconstruct the entity must be selected, including
    /// the document metadata under the [`SELECT_ID`] and [`SELECT_CAS`]
    /// aliases (`META(bucket).id AS _ID`, `META(bucket).cas AS _CAS`).
    /// Rows missing either alias fail with
    /// [`DataAccessError::QueryExecution`].
    fn find_by_query<T: Document>(&self, query: &N1qlQuery) -> Result<Vec<T>, DataAccessError>;

    /// Run an N1QL query and decode each row's single selected field into
    /// a fragment type, without document metadata.
    fn find_by_query_projection<T: DeserializeOwned>(
        &self,
        query: &N1qlQuery,
    ) -> Result<Vec<T>, DataAccessError>;

    /// Run an N1QL query with direct access to the raw [`QueryResult`],
    /// errors still translated.
    fn query(&self, query: &N1qlQuery) -> Result<QueryResult, DataAccessError>;

    /// Check whether a document with the given id exists.
    fn exists(&self, id: &str) -> Result<bool, DataAccessError>;

    /// Remove the document stored under the entity's id, subject to the
    /// durability constraints.
    fn remove_with<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Remove the document stored under the entity's id.
    fn remove<T: Document>(&self, entity: &T) -> Result<(), DataAccessError> {
        self.remove_with(entity, PersistTo::None, ReplicateTo::None)
    }

    /// Remove a batch of entities' documents, subject to the durability
    /// constraints.
    fn remove_all_with<T: Document>(
        &self,
        batch: &[T],
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Remove a batch of entities' documents.
    fn remove_all<T: Document>(&self, batch: &[T]) -> Result<(), DataAccessError> {
        self.remove_all_with(batch, PersistTo::None, ReplicateTo::None)
    }

    /// Remove a document by its bare key, subject to the durability
    /// constraints.
    fn remove_by_id_with(
        &self,
        id: &str,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError>;

    /// Remove a document by its bare key.
    fn remove_by_id(&self, id: &str) -> Result<(), DataAccessError> {
        self.remove_by_id_with(id, PersistTo::None, ReplicateTo::None)
    }

    /// Run an arbitrary action against the bucket client, translating its
    /// errors into [`DataAccessError`].
    fn execute<T, F>(&self, action: F) -> Result<T, DataAccessError>
    where
        F: FnOnce(&Self::Client) -> Result<T, BucketError>;

    /// The underlying bucket client.
    fn bucket(&self) -> &Self::Client;

    /// Metadata about the cluster the bucket belongs to.
    fn cluster_info(&self) -> Result<ClusterInfo, DataAccessError>;

    /// The converter used to map entities.
    fn converter(&self) -> &Self::Converter;
}
