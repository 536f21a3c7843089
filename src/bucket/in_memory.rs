//! InMemoryBucket - HashMap-backed bucket client for testing and development.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::{BucketClient, BucketError, ClusterInfo};
use crate::document::RawDocument;
use crate::durability::{PersistTo, ReplicateTo};
use crate::query::{N1qlQuery, QueryResult, QueryRow, ViewQuery, ViewResult, ViewRow};

/// Topology and naming of an in-memory bucket.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    pub name: String,
    /// Nodes available to satisfy persistence constraints.
    pub nodes: u32,
    /// Replicas available to satisfy replication constraints.
    pub replicas: u32,
}

impl Default for BucketConfig {
    fn default() -> Self {
        BucketConfig {
            name: "default".to_string(),
            nodes: 1,
            replicas: 0,
        }
    }
}

/// Internal stored representation of a document.
struct StoredDocument {
    content: Vec<u8>,
    cas: u64,
}

/// Snapshot of one stored document, handed to registered query handlers.
#[derive(Debug, Clone)]
pub struct SnapshotDocument {
    pub id: String,
    pub cas: u64,
    pub content: Value,
}

struct ViewDef {
    map: Box<dyn Fn(&str, &Value) -> Vec<(Value, Value)> + Send + Sync>,
    reduce: Option<Box<dyn Fn(&[Value]) -> Value + Send + Sync>>,
}

type QueryHandler =
    Box<dyn Fn(&N1qlQuery, &[SnapshotDocument]) -> Result<Vec<QueryRow>, String> + Send + Sync>;

/// In-memory bucket client backed by a HashMap.
///
/// Documents are stored by key with a monotonically increasing CAS token.
/// Durability constraints are checked against the configured topology and
/// rejected when unsatisfiable; an in-memory write that passes the check
/// is considered durable immediately.
///
/// Views are registered as map closures over `(id, json content)`, with an
/// optional reduce closure. N1QL statements are opaque: a query only
/// executes if a handler was registered for its exact statement text.
///
/// Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryBucket {
    name: String,
    nodes: u32,
    replicas: u32,
    cas_seq: Arc<AtomicU64>,
    storage: Arc<RwLock<HashMap<String, StoredDocument>>>,
    views: Arc<RwLock<HashMap<(String, String), ViewDef>>>,
    handlers: Arc<RwLock<HashMap<String, QueryHandler>>>,
}

impl Default for InMemoryBucket {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBucket {
    /// Create a bucket with the default config (one node, no replicas).
    pub fn new() -> Self {
        Self::with_config(BucketConfig::default())
    }

    pub fn with_config(config: BucketConfig) -> Self {
        InMemoryBucket {
            name: config.name,
            nodes: config.nodes,
            replicas: config.replicas,
            cas_seq: Arc::new(AtomicU64::new(1)),
            storage: Arc::new(RwLock::new(HashMap::new())),
            views: Arc::new(RwLock::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a map-only view under a design document.
    ///
    /// The map closure receives each stored document's key and JSON content
    /// and returns the `(key, value)` rows it emits.
    pub fn register_view<F>(&self, design: impl Into<String>, view: impl Into<String>, map: F)
    where
        F: Fn(&str, &Value) -> Vec<(Value, Value)> + Send + Sync + 'static,
    {
        self.register(design, view, Box::new(map), None);
    }

    /// Register a view with both a map and a reduce closure.
    pub fn register_view_with_reduce<F, R>(
        &self,
        design: impl Into<String>,
        view: impl Into<String>,
        map: F,
        reduce: R,
    ) where
        F: Fn(&str, &Value) -> Vec<(Value, Value)> + Send + Sync + 'static,
        R: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.register(design, view, Box::new(map), Some(Box::new(reduce)));
    }

    fn register(
        &self,
        design: impl Into<String>,
        view: impl Into<String>,
        map: Box<dyn Fn(&str, &Value) -> Vec<(Value, Value)> + Send + Sync>,
        reduce: Option<Box<dyn Fn(&[Value]) -> Value + Send + Sync>>,
    ) {
        if let Ok(mut views) = self.views.write() {
            views.insert((design.into(), view.into()), ViewDef { map, reduce });
        }
    }

    /// Register a handler for an N1QL statement.
    ///
    /// The handler receives the query (for its placeholder values) and a
    /// snapshot of all stored documents, and returns the result rows.
    pub fn register_query<F>(&self, statement: impl Into<String>, handler: F)
    where
        F: Fn(&N1qlQuery, &[SnapshotDocument]) -> Result<Vec<QueryRow>, String>
            + Send
            + Sync
            + 'static,
    {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.insert(statement.into(), Box::new(handler));
        }
    }

    fn next_cas(&self) -> u64 {
        self.cas_seq.fetch_add(1, AtomicOrdering::Relaxed)
    }

    fn check_durability(
        &self,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), BucketError> {
        if persist_to.nodes_required() > self.nodes
            || replicate_to.replicas_required() > self.replicas
        {
            return Err(BucketError::DurabilityImpossible {
                persist_to,
                replicate_to,
                nodes: self.nodes,
                replicas: self.replicas,
            });
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<SnapshotDocument>, BucketError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| BucketError::LockPoisoned("read"))?;

        let mut docs = Vec::with_capacity(storage.len());
        for (id, stored) in storage.iter() {
            // Documents with non-JSON content are invisible to queries.
            if let Ok(content) = serde_json::from_slice(&stored.content) {
                docs.push(SnapshotDocument {
                    id: id.clone(),
                    cas: stored.cas,
                    content,
                });
            }
        }
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }
}

impl BucketClient for InMemoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, id: &str) -> Result<Option<RawDocument>, BucketError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| BucketError::LockPoisoned("read"))?;

        Ok(storage
            .get(id)
            .map(|stored| RawDocument::with_cas(id, stored.content.clone(), stored.cas)))
    }

    fn exists(&self, id: &str) -> Result<bool, BucketError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| BucketError::LockPoisoned("read"))?;
        Ok(storage.contains_key(id))
    }

    fn upsert(
        &self,
        doc: RawDocument,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<u64, BucketError> {
        self.check_durability(persist_to, replicate_to)?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| BucketError::LockPoisoned("write"))?;

        let cas = self.next_cas();
        storage.insert(
            doc.id,
            StoredDocument {
                content: doc.content,
                cas,
            },
        );
        Ok(cas)
    }

    fn insert(
        &self,
        doc: RawDocument,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<u64, BucketError> {
        self.check_durability(persist_to, replicate_to)?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| BucketError::LockPoisoned("write"))?;

        if storage.contains_key(&doc.id) {
            return Err(BucketError::KeyExists { id: doc.id });
        }

        let cas = self.next_cas();
        storage.insert(
            doc.id,
            StoredDocument {
                content: doc.content,
                cas,
            },
        );
        Ok(cas)
    }

    fn replace(
        &self,
        doc: RawDocument,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<u64, BucketError> {
        self.check_durability(persist_to, replicate_to)?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| BucketError::LockPoisoned("write"))?;

        if !storage.contains_key(&doc.id) {
            return Err(BucketError::KeyNotFound { id: doc.id });
        }

        let cas = self.next_cas();
        storage.insert(
            doc.id,
            StoredDocument {
                content: doc.content,
                cas,
            },
        );
        Ok(cas)
    }

    fn remove(
        &self,
        id: &str,
        persist_to: PersistTo,
        replicate_to: ReplicateTo,
    ) -> Result<(), BucketError> {
        self.check_durability(persist_to, replicate_to)?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| BucketError::LockPoisoned("write"))?;

        if storage.remove(id).is_none() {
            return Err(BucketError::KeyNotFound { id: id.to_string() });
        }
        Ok(())
    }

    fn query_view(&self, query: &ViewQuery) -> Result<ViewResult, BucketError> {
        let views = self
            .views
            .read()
            .map_err(|_| BucketError::LockPoisoned("views read"))?;

        let def = views
            .get(&(query.design().to_string(), query.view().to_string()))
            .ok_or_else(|| BucketError::UnknownView {
                design: query.design().to_string(),
                view: query.view().to_string(),
            })?;

        let docs = self.snapshot()?;
        let mut rows = Vec::new();
        for doc in &docs {
            for (key, value) in (def.map)(&doc.id, &doc.content) {
                rows.push(ViewRow::emitted(doc.id.clone(), key, value));
            }
        }

        rows.sort_by(|a, b| cmp_keys(&a.key, &b.key));
        rows.retain(|row| key_selected(query, &row.key));
        let total_rows = rows.len() as u64;

        if query.is_reduce() {
            let reduce = def.reduce.as_ref().ok_or_else(|| {
                BucketError::QueryFailed(format!(
                    "view {}/{} has no reduce function",
                    query.design(),
                    query.view()
                ))
            })?;
            let values: Vec<Value> = rows.into_iter().map(|row| row.value).collect();
            let reduced = reduce(&values);
            return Ok(ViewResult {
                rows: vec![ViewRow::reduced(Value::Null, reduced)],
                total_rows,
            });
        }

        if query.is_descending() {
            rows.reverse();
        }

        let rows = rows
            .into_iter()
            .skip(query.skip_count())
            .take(query.limit_option().unwrap_or(usize::MAX))
            .collect();

        Ok(ViewResult { rows, total_rows })
    }

    fn query(&self, query: &N1qlQuery) -> Result<QueryResult, BucketError> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| BucketError::LockPoisoned("handlers read"))?;

        let handler = handlers.get(query.statement()).ok_or_else(|| {
            BucketError::QueryFailed(format!(
                "no handler registered for statement: {}",
                query.statement()
            ))
        })?;

        let docs = self.snapshot()?;
        match handler(query, &docs) {
            Ok(rows) => Ok(QueryResult::with_rows(rows)),
            Err(msg) => Err(BucketError::QueryFailed(msg)),
        }
    }

    fn cluster_info(&self) -> Result<ClusterInfo, BucketError> {
        Ok(ClusterInfo {
            version: "in-memory".to_string(),
            nodes: self.nodes,
            buckets: vec![self.name.clone()],
        })
    }
}

/// Whether a row key passes the query's key/keys/range selection.
fn key_selected(query: &ViewQuery, key: &Value) -> bool {
    if let Some(exact) = query.key_option() {
        return key == exact;
    }
    if let Some(keys) = query.keys_option() {
        return keys.contains(key);
    }
    if let Some(start) = query.start_key_option() {
        if cmp_keys(key, start) == Ordering::Less {
            return false;
        }
    }
    if let Some(end) = query.end_key_option() {
        if cmp_keys(key, end) == Ordering::Greater {
            return false;
        }
    }
    true
}

/// Total order over JSON keys: null < bool < number < string < array < object.
fn cmp_keys(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xi, yi) in x.iter().zip(y.iter()) {
                match cmp_keys(xi, yi) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, body: Value) -> RawDocument {
        RawDocument::new(id, serde_json::to_vec(&body).unwrap())
    }

    fn none() -> (PersistTo, ReplicateTo) {
        (PersistTo::None, ReplicateTo::None)
    }

    #[test]
    fn upsert_and_get() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();

        let cas = bucket.upsert(doc("a", json!({"n": 1})), p, r).unwrap();
        assert!(cas > 0);

        let fetched = bucket.get("a").unwrap().unwrap();
        assert_eq!(fetched.id, "a");
        assert_eq!(fetched.cas, cas);

        let body: Value = serde_json::from_slice(&fetched.content).unwrap();
        assert_eq!(body, json!({"n": 1}));
    }

    #[test]
    fn get_missing_returns_none() {
        let bucket = InMemoryBucket::new();
        assert!(bucket.get("missing").unwrap().is_none());
    }

    #[test]
    fn upsert_overwrites_and_bumps_cas() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();

        let first = bucket.upsert(doc("a", json!(1)), p, r).unwrap();
        let second = bucket.upsert(doc("a", json!(2)), p, r).unwrap();
        assert!(second > first);

        let fetched = bucket.get("a").unwrap().unwrap();
        let body: Value = serde_json::from_slice(&fetched.content).unwrap();
        assert_eq!(body, json!(2));
    }

    #[test]
    fn insert_fails_on_existing() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();

        bucket.insert(doc("a", json!(1)), p, r).unwrap();
        let err = bucket.insert(doc("a", json!(2)), p, r).unwrap_err();
        assert_eq!(err, BucketError::KeyExists { id: "a".into() });
    }

    #[test]
    fn replace_fails_on_missing() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();

        let err = bucket.replace(doc("a", json!(1)), p, r).unwrap_err();
        assert_eq!(err, BucketError::KeyNotFound { id: "a".into() });

        bucket.insert(doc("a", json!(1)), p, r).unwrap();
        bucket.replace(doc("a", json!(2)), p, r).unwrap();
    }

    #[test]
    fn remove_and_exists() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();

        bucket.upsert(doc("a", json!(1)), p, r).unwrap();
        assert!(bucket.exists("a").unwrap());

        bucket.remove("a", p, r).unwrap();
        assert!(!bucket.exists("a").unwrap());

        let err = bucket.remove("a", p, r).unwrap_err();
        assert_eq!(err, BucketError::KeyNotFound { id: "a".into() });
    }

    #[test]
    fn durability_beyond_topology_is_rejected() {
        let bucket = InMemoryBucket::with_config(BucketConfig {
            name: "test".into(),
            nodes: 1,
            replicas: 0,
        });

        let err = bucket
            .upsert(doc("a", json!(1)), PersistTo::Two, ReplicateTo::None)
            .unwrap_err();
        assert!(matches!(err, BucketError::DurabilityImpossible { .. }));

        let err = bucket
            .upsert(doc("a", json!(1)), PersistTo::None, ReplicateTo::One)
            .unwrap_err();
        assert!(matches!(err, BucketError::DurabilityImpossible { .. }));

        // Nothing was written
        assert!(!bucket.exists("a").unwrap());
    }

    #[test]
    fn durability_within_topology_succeeds() {
        let bucket = InMemoryBucket::with_config(BucketConfig {
            name: "test".into(),
            nodes: 3,
            replicas: 2,
        });

        bucket
            .upsert(doc("a", json!(1)), PersistTo::Three, ReplicateTo::Two)
            .unwrap();
        assert!(bucket.exists("a").unwrap());
    }

    #[test]
    fn view_maps_documents_to_rows() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();
        bucket.register_view("beers", "by_name", |id, content| {
            vec![(content["name"].clone(), json!({ "doc": id }))]
        });

        bucket.upsert(doc("b1", json!({"name": "Porter"})), p, r).unwrap();
        bucket.upsert(doc("b2", json!({"name": "Ale"})), p, r).unwrap();

        let result = bucket
            .query_view(&ViewQuery::from("beers", "by_name"))
            .unwrap();
        assert_eq!(result.total_rows, 2);
        // Sorted ascending by key
        assert_eq!(result.rows[0].key, json!("Ale"));
        assert_eq!(result.rows[1].key, json!("Porter"));
        assert_eq!(result.rows[0].id.as_deref(), Some("b2"));
    }

    #[test]
    fn view_key_range_limit_and_descending() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();
        bucket.register_view("beers", "by_abv", |_, content| {
            vec![(content["abv"].clone(), Value::Null)]
        });

        for (id, abv) in [("b1", 4.0), ("b2", 5.5), ("b3", 7.0), ("b4", 9.0)] {
            bucket.upsert(doc(id, json!({"abv": abv})), p, r).unwrap();
        }

        let result = bucket
            .query_view(
                &ViewQuery::from("beers", "by_abv")
                    .start_key(5.0)
                    .end_key(9.0)
                    .descending(true)
                    .limit(2),
            )
            .unwrap();

        assert_eq!(result.total_rows, 3);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].key, json!(9.0));
        assert_eq!(result.rows[1].key, json!(7.0));
    }

    #[test]
    fn view_exact_key() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();
        bucket.register_view("beers", "by_name", |_, content| {
            vec![(content["name"].clone(), Value::Null)]
        });

        bucket.upsert(doc("b1", json!({"name": "Porter"})), p, r).unwrap();
        bucket.upsert(doc("b2", json!({"name": "Ale"})), p, r).unwrap();

        let result = bucket
            .query_view(&ViewQuery::from("beers", "by_name").key("Porter"))
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].id.as_deref(), Some("b1"));
    }

    #[test]
    fn reduced_view_rows_have_no_id() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();
        bucket.register_view_with_reduce(
            "beers",
            "count",
            |_, _| vec![(Value::Null, json!(1))],
            |values| json!(values.len()),
        );

        bucket.upsert(doc("b1", json!({})), p, r).unwrap();
        bucket.upsert(doc("b2", json!({})), p, r).unwrap();

        let result = bucket
            .query_view(&ViewQuery::from("beers", "count").reduce(true))
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert!(result.rows[0].id.is_none());
        assert_eq!(result.rows[0].value, json!(2));
    }

    #[test]
    fn reduce_without_reduce_fn_fails() {
        let bucket = InMemoryBucket::new();
        bucket.register_view("beers", "by_name", |_, _| vec![]);

        let err = bucket
            .query_view(&ViewQuery::from("beers", "by_name").reduce(true))
            .unwrap_err();
        assert!(matches!(err, BucketError::QueryFailed(_)));
    }

    #[test]
    fn unknown_view_fails() {
        let bucket = InMemoryBucket::new();
        let err = bucket
            .query_view(&ViewQuery::from("nope", "nothing"))
            .unwrap_err();
        assert_eq!(
            err,
            BucketError::UnknownView {
                design: "nope".into(),
                view: "nothing".into()
            }
        );
    }

    #[test]
    fn query_runs_registered_handler() {
        let bucket = InMemoryBucket::new();
        let (p, r) = none();
        bucket.upsert(doc("b1", json!({"abv": 4.0})), p, r).unwrap();
        bucket.upsert(doc("b2", json!({"abv": 8.0})), p, r).unwrap();

        bucket.register_query("SELECT * FROM beers WHERE abv > $1", |query, docs| {
            let min = query.positional_params()[0].as_f64().ok_or("bad param")?;
            Ok(docs
                .iter()
                .filter(|d| d.content["abv"].as_f64().unwrap_or(0.0) > min)
                .map(|d| d.content.clone())
                .collect())
        });

        let result = bucket
            .query(&N1qlQuery::parameterized(
                "SELECT * FROM beers WHERE abv > $1",
                vec![json!(5.0)],
            ))
            .unwrap();
        assert_eq!(result.rows, vec![json!({"abv": 8.0})]);
    }

    #[test]
    fn query_without_handler_fails() {
        let bucket = InMemoryBucket::new();
        let err = bucket
            .query(&N1qlQuery::simple("SELECT 1"))
            .unwrap_err();
        assert!(matches!(err, BucketError::QueryFailed(_)));
    }

    #[test]
    fn handler_error_becomes_query_failed() {
        let bucket = InMemoryBucket::new();
        bucket.register_query("BROKEN", |_, _| Err("engine exploded".to_string()));

        let err = bucket.query(&N1qlQuery::simple("BROKEN")).unwrap_err();
        assert_eq!(err, BucketError::QueryFailed("engine exploded".into()));
    }

    #[test]
    fn cluster_info_reflects_config() {
        let bucket = InMemoryBucket::with_config(BucketConfig {
            name: "travel".into(),
            nodes: 3,
            replicas: 1,
        });

        let info = bucket.cluster_info().unwrap();
        assert_eq!(info.nodes, 3);
        assert_eq!(info.buckets, vec!["travel".to_string()]);
    }

    #[test]
    fn clone_shares_storage() {
        let bucket = InMemoryBucket::new();
        let clone = bucket.clone();
        let (p, r) = none();

        bucket.upsert(doc("a", json!(1)), p, r).unwrap();
        assert!(clone.exists("a").unwrap());
    }

    #[test]
    fn key_ordering() {
        assert_eq!(cmp_keys(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(cmp_keys(&json!("a"), &json!("b")), Ordering::Less);
        assert_eq!(cmp_keys(&json!(2), &json!("a")), Ordering::Less);
        assert_eq!(cmp_keys(&Value::Null, &json!(false)), Ordering::Less);
        assert_eq!(
            cmp_keys(&json!([1, 2]), &json!([1, 3])),
            Ordering::Less
        );
        assert_eq!(cmp_keys(&json!([1]), &json!([1, 0])), Ordering::Less);
    }
}
