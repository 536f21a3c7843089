use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bucket::{BucketClient, BucketError, ClusterInfo, InMemoryBucket};
use crate::convert::{DocumentConverter, JsonConverter};
use crate::document::{Document, RawDocument};
use crate::durability::{PersistTo, ReplicateTo};
#[cfg(feature = "emitter")]
use crate::emitter::MutationEvents;
use crate::error::DataAccessError;
use crate::operations::{BucketOperations, SELECT_CAS, SELECT_ID};
use crate::query::{N1qlQuery, QueryResult, ViewQuery, ViewResult};

/// The central mapping layer over a bucket client: marshals arguments,
/// delegates to the client, converts results, and translates client and
/// converter failures into [`DataAccessError`].
pub struct BucketTemplate<C, V> {
    client: C,
    converter: V,
    #[cfg(feature = "emitter")]
    events: MutationEvents,
}

impl<C: BucketClient, V: DocumentConverter> BucketTemplate<C, V> {
    pub fn new(client: C, converter: V) -> Self {
        BucketTemplate {
            client,
            converter,
            #[cfg(feature = "emitter")]
            events: MutationEvents::new(),
        }
    }

    /// Lifecycle events fired around mutations.
    #[cfg(feature = "emitter")]
    pub fn events(&self) -> &MutationEvents {
        &self.events
    }

    fn emit(&self, event: &str, id: &str) {
        #[cfg(feature = "emitter")]
        self.events.emit(event, id);
        #[cfg(not(feature = "emitter"))]
        let _ = (event, id);
    }

    fn write<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
        op: fn(&C, RawDocument, PersistTo, ReplicateTo) -> Result<u64, BucketError>,
    ) -> Result<(), DataAccessError> {
        self.emit(event_names::BEFORE_SAVE, entity.id());
        let raw = self.converter.encode(entity)?;
        op(&self.client, raw, persist_to, replicate_to)?;
        self.emit(event_names::AFTER_SAVE, entity.id());
        Ok(())
    }
}

impl BucketTemplate<InMemoryBucket, JsonConverter> {
    /// An in-memory template for tests and development.
    pub fn in_memory() -> Self {
        BucketTemplate::new(InMemoryBucket::new(), JsonConverter::new())
    }

    /// An in-memory template over the given bucket.
    pub fn over(bucket: InMemoryBucket) -> Self {
        BucketTemplate::new(bucket, JsonConverter::new())
    }
}

#[cfg(feature = "emitter")]
mod event_names {
    pub use crate::emitter::{AFTER_REMOVE, AFTER_SAVE, BEFORE_REMOVE, BEFORE_SAVE};
}

#[cfg(not(feature = "emitter"))]
mod event_names {
    pub const BEFORE_SAVE: &str = "before_save";
    pub const AFTER_SAVE: &str = "after_save";
    pub const BEFORE_REMOVE: &str = "before_remove";
    pub const AFTER_REMOVE: &str = "after_remove";
}

impl<C: BucketClient, V: DocumentConverter> BucketOperations for BucketTemplate<C, V> {
    type Client = C;
    type Converter = V;

    fn save_with<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        self.write(entity, persist_to, replicate_to, C::upsert)
    }

    fn save_all_with<T: Document>(
        &self,
        batch: &[T],
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        for entity in batch {
            self.save_with(entity, persist_to, replicate_to)?;
        }
        Ok(())
    }

    fn insert_with<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        self.write(entity, persist_to, replicate_to, C::insert)
    }

    fn insert_all_with<T: Document>(
        &self,
        batch: &[T],
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        for entity in batch {
            self.insert_with(entity, persist_to, replicate_to)?;
        }
        Ok(())
    }

    fn update_with<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        self.write(entity, persist_to, replicate_to, C::replace)
    }

    fn update_all_with<T: Document>(
        &self,
        batch: &[T],
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        for entity in batch {
            self.update_with(entity, persist_to, replicate_to)?;
        }
        Ok(())
    }

    fn find_by_id<T: Document>(&self, id: &str) -> Result<Option<T>, DataAccessError> {
        match self.client.get(id)? {
            Some(raw) => Ok(Some(self.converter.decode(&raw)?)),
            None => Ok(None),
        }
    }

    fn find_by_view<T: Document>(&self, query: &ViewQuery) -> Result<Vec<T>, DataAccessError> {
        let result = self.client.query_view(query)?;

        let mut entities = Vec::with_capacity(result.rows.len());
        for row in result.rows {
            let id = row.id.ok_or_else(|| {
                DataAccessError::QueryExecution(
                    "view row carries no document id; reduced views cannot be mapped to entities"
                        .to_string(),
                )
            })?;
            // The emitting document may have been removed since the row
            // was produced; such rows are dropped.
            if let Some(raw) = self.client.get(&id)? {
                entities.push(self.converter.decode(&raw)?);
            }
        }
        Ok(entities)
    }

    fn query_view(&self, query: &ViewQuery) -> Result<ViewResult, DataAccessError> {
        self.client.query_view(query).map_err(Into::into)
    }

    fn find_by_query<T: Document>(&self, query: &N1qlQuery) -> Result<Vec<T>, DataAccessError> {
        let result = self.query(query)?;
        if !result.success() {
            return Err(DataAccessError::QueryExecution(result.errors.join("; ")));
        }

        let mut entities = Vec::with_capacity(result.rows.len());
        for row in result.rows {
            entities.push(entity_from_row(&self.converter, row)?);
        }
        Ok(entities)
    }

    fn find_by_query_projection<T: DeserializeOwned>(
        &self,
        query: &N1qlQuery,
    ) -> Result<Vec<T>, DataAccessError> {
        let result = self.query(query)?;
        if !result.success() {
            return Err(DataAccessError::QueryExecution(result.errors.join("; ")));
        }

        let mut fragments = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            fragments.push(self.converter.decode_fragment(row)?);
        }
        Ok(fragments)
    }

    fn query(&self, query: &N1qlQuery) -> Result<QueryResult, DataAccessError> {
        self.client.query(query).map_err(Into::into)
    }

    fn exists(&self, id: &str) -> Result<bool, DataAccessError> {
        self.client.exists(id).map_err(Into::into)
    }

    fn remove_with<T: Document>(
        &self,
        entity: &T,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        self.remove_by_id_with(entity.id(), persist_to, replicate_to)
    }

    fn remove_all_with<T: Document>(
        &self,
        batch: &[T],
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        for entity in batch {
            self.remove_with(entity, persist_to, replicate_to)?;
        }
        Ok(())
    }

    fn remove_by_id_with(
        &self,
        id: &str,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), DataAccessError> {
        self.emit(event_names::BEFORE_REMOVE, id);
        self.client.remove(id, persist_to, replicate_to)?;
        self.emit(event_names::AFTER_REMOVE, id);
        Ok(())
    }

    fn execute<T, F>(&self, action: F) -> Result<T, DataAccessError>
    where
        F: FnOnce(&Self::Client) -> Result<T, BucketError>,
    {
        action(&self.client).map_err(Into::into)
    }

    fn bucket(&self) -> &Self::Client {
        &self.client
    }

    fn cluster_info(&self) -> Result<ClusterInfo, DataAccessError> {
        self.client.cluster_info().map_err(Into::into)
    }

    fn converter(&self) -> &Self::Converter {
        &self.converter
    }
}

/// Reconstruct an entity from an N1QL row that projects `_ID` and `_CAS`.
fn entity_from_row<V: DocumentConverter, T: Document>(
    converter: &V,
    row: Value,
) -> Result<T, DataAccessError> {
    let Value::Object(mut fields) = row else {
        return Err(missing_meta());
    };

    let id = match fields.remove(SELECT_ID) {
        Some(Value::String(id)) => id,
        _ => return Err(missing_meta()),
    };
    let cas = match fields.remove(SELECT_CAS) {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(missing_meta)?,
        _ => return Err(missing_meta()),
    };

    let content = serde_json::to_vec(&Value::Object(fields))
        .map_err(|e| DataAccessError::QueryExecution(e.to_string()))?;
    let raw = RawDocument::with_cas(id, content, cas);
    Ok(converter.decode(&raw)?)
}

fn missing_meta() -> DataAccessError {
    DataAccessError::QueryExecution(format!(
        "query did not project the {} and {} metadata (select META(bucket).id AS {} and META(bucket).cas AS {})",
        SELECT_ID, SELECT_CAS, SELECT_ID, SELECT_CAS
    ))
}
