use serde_json::Value;
use tracing::trace;

/// Key argument accepted by [`FastIndex::set`](crate::FastIndex::set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKey {
    Single(String),
    Multi(Vec<String>),
}

impl IndexKey {
    /// True when setting this key would index nothing.
    pub fn is_blank(&self) -> bool {
        match self {
            IndexKey::Single(key) => key.is_empty(),
            IndexKey::Multi(keys) => keys.iter().all(String::is_empty),
        }
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        IndexKey::Single(value.to_owned())
    }
}

impl From<String> for IndexKey {
    fn from(value: String) -> Self {
        IndexKey::Single(value)
    }
}

impl From<&String> for IndexKey {
    fn from(value: &String) -> Self {
        IndexKey::Single(value.clone())
    }
}

impl From<Vec<String>> for IndexKey {
    fn from(values: Vec<String>) -> Self {
        IndexKey::Multi(values)
    }
}

impl From<Vec<&str>> for IndexKey {
    fn from(values: Vec<&str>) -> Self {
        IndexKey::Multi(values.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for IndexKey {
    fn from(values: &[&str]) -> Self {
        IndexKey::Multi(values.iter().map(|value| (*value).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for IndexKey {
    fn from(values: [&str; N]) -> Self {
        IndexKey::Multi(values.iter().map(|value| (*value).to_owned()).collect())
    }
}

/// An item that can be loaded into an index by field name.
pub trait Document {
    /// Keys stored under `name`, or `None` when the field is missing or has
    /// a shape that cannot be indexed.
    fn field(&self, name: &str) -> Option<IndexKey>;

    /// Items for which this returns true are skipped by `load_one`.
    fn is_blank(&self) -> bool {
        false
    }
}

impl Document for Value {
    fn field(&self, name: &str) -> Option<IndexKey> {
        match self.get(name)? {
            Value::String(key) => Some(IndexKey::Single(key.clone())),
            Value::Array(items) => {
                let mut keys = Vec::with_capacity(items.len());
                collect_strings(items, &mut keys);
                Some(IndexKey::Multi(keys))
            }
            other => {
                trace!(field = name, kind = value_kind(other), "skipping unindexable field");
                None
            }
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(flag) => !flag,
            Value::String(text) => text.is_empty(),
            Value::Number(number) => number.as_f64() == Some(0.0),
            Value::Array(_) | Value::Object(_) => false,
        }
    }
}

// Nested arrays are flattened in order; non-string leaves are skipped.
fn collect_strings(items: &[Value], keys: &mut Vec<String>) {
    for item in items {
        match item {
            Value::String(key) => keys.push(key.clone()),
            Value::Array(nested) => collect_strings(nested, keys),
            _ => {}
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
