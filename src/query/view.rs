use serde_json::Value;

/// A query against a predefined map/reduce view.
///
/// Identifies a view by design document and view name, plus the usual
/// row-selection options. Options are chainable:
///
/// ```
/// use bucketmap::ViewQuery;
///
/// let query = ViewQuery::from("beers", "by_abv")
///     .start_key(4.0)
///     .end_key(8.0)
///     .limit(10)
///     .descending(true);
/// ```
#[derive(Debug, Clone)]
pub struct ViewQuery {
    design: String,
    view: String,
    key: Option<Value>,
    keys: Option<Vec<Value>>,
    start_key: Option<Value>,
    end_key: Option<Value>,
    limit: Option<usize>,
    skip: usize,
    descending: bool,
    reduce: bool,
}

impl ViewQuery {
    /// Query the given view of the given design document.
    pub fn from(design: impl Into<String>, view: impl Into<String>) -> Self {
        ViewQuery {
            design: design.into(),
            view: view.into(),
            key: None,
            keys: None,
            start_key: None,
            end_key: None,
            limit: None,
            skip: 0,
            descending: false,
            reduce: false,
        }
    }

    /// Match a single row key exactly.
    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Match any of the given row keys exactly.
    pub fn keys(mut self, keys: Vec<Value>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Lower bound of the row key range (inclusive).
    pub fn start_key(mut self, key: impl Into<Value>) -> Self {
        self.start_key = Some(key.into());
        self
    }

    /// Upper bound of the row key range (inclusive).
    pub fn end_key(mut self, key: impl Into<Value>) -> Self {
        self.end_key = Some(key.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sort rows by descending key order.
    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Run the view's reduce function instead of returning mapped rows.
    pub fn reduce(mut self, reduce: bool) -> Self {
        self.reduce = reduce;
        self
    }

    pub fn design(&self) -> &str {
        &self.design
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    pub fn key_option(&self) -> Option<&Value> {
        self.key.as_ref()
    }

    pub fn keys_option(&self) -> Option<&[Value]> {
        self.keys.as_deref()
    }

    pub fn start_key_option(&self) -> Option<&Value> {
        self.start_key.as_ref()
    }

    pub fn end_key_option(&self) -> Option<&Value> {
        self.end_key.as_ref()
    }

    pub fn limit_option(&self) -> Option<usize> {
        self.limit
    }

    pub fn skip_count(&self) -> usize {
        self.skip
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn is_reduce(&self) -> bool {
        self.reduce
    }
}

/// One row of a view result.
///
/// `id` is the key of the document that emitted the row; reduced rows
/// carry no id.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub id: Option<String>,
    pub key: Value,
    pub value: Value,
}

impl ViewRow {
    pub fn emitted(id: impl Into<String>, key: Value, value: Value) -> Self {
        ViewRow {
            id: Some(id.into()),
            key,
            value,
        }
    }

    pub fn reduced(key: Value, value: Value) -> Self {
        ViewRow {
            id: None,
            key,
            value,
        }
    }
}

/// Result of a view query: the selected rows plus the total number of
/// rows the view holds (before limit/skip).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewResult {
    pub rows: Vec<ViewRow>,
    pub total_rows: u64,
}

impl ViewResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
