use std::collections::HashMap;

use serde_json::Value;

/// A row returned by an N1QL query, as raw JSON.
pub type QueryRow = Value;

/// A declarative N1QL-style query: a statement plus optional placeholder
/// values.
///
/// The statement is opaque to the mapping layer and executed by the bucket
/// client. Placeholders are either positional (`$1`, `$2`, ...) or named
/// (`$name`).
#[derive(Debug, Clone, PartialEq)]
pub struct N1qlQuery {
    statement: String,
    positional: Vec<Value>,
    named: HashMap<String, Value>,
}

impl N1qlQuery {
    /// A plain statement without placeholders.
    pub fn simple(statement: impl Into<String>) -> Self {
        N1qlQuery {
            statement: statement.into(),
            positional: Vec::new(),
            named: HashMap::new(),
        }
    }

    /// A statement with positional placeholder values.
    pub fn parameterized(statement: impl Into<String>, positional: Vec<Value>) -> Self {
        N1qlQuery {
            statement: statement.into(),
            positional,
            named: HashMap::new(),
        }
    }

    /// A statement with named placeholder values.
    pub fn named<I, K>(statement: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        N1qlQuery {
            statement: statement.into(),
            positional: Vec::new(),
            named: params.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn positional_params(&self) -> &[Value] {
        &self.positional
    }

    pub fn named_params(&self) -> &HashMap<String, Value> {
        &self.named
    }

    /// Look up a named placeholder value.
    pub fn named_param(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }
}

/// Result of an N1QL query: raw rows plus any errors the engine reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<QueryRow>,
    pub errors: Vec<String>,
}

impl QueryResult {
    pub fn with_rows(rows: Vec<QueryRow>) -> Self {
        QueryResult {
            rows,
            errors: Vec::new(),
        }
    }

    /// Whether the query completed without engine errors.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
