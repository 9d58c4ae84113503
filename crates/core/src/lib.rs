//! Roster core types: list records, field mappings and paged query shapes.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod mapping;
pub mod skill;

pub use mapping::{FieldMapping, FieldMappingEntry};
pub use skill::{Author, Skill};

/// Errors raised while decoding configuration or list items.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid field mapping: {0}")]
    InvalidMapping(#[from] serde_json::Error),
    #[error("decode: {0}")]
    Decode(String),
}

/// One fetched list item. Keys are list field names (`Id`, `Title`, `Author`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self { Self(Map::new()) }

    pub fn from_map(map: Map<String, Value>) -> Self { Self(map) }

    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> { self.0.remove(key) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn keys(&self) -> impl Iterator<Item = &str> { self.0.keys().map(|k| k.as_str()) }

    pub fn as_map(&self) -> &Map<String, Value> { &self.0 }

    pub fn into_map(self) -> Map<String, Value> { self.0 }

    /// Item identity (`Id`).
    pub fn id(&self) -> Option<u64> { self.0.get("Id").and_then(|v| v.as_u64()) }

    /// Resolve a dot path such as `Title` or `Author.Title`.
    /// Missing segments, non-object intermediates and JSON `null` all resolve to `None`.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        resolve_path(&self.0, path)
    }

    /// Resolve a path and render it as display text. Only scalars render; empty strings count as absent.
    pub fn resolve_text(&self, path: &str) -> Option<String> {
        self.resolve(path).and_then(render_scalar)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self { Self(map) }
}

/// Walk `path` (segments separated by `.`) from `root`.
pub fn resolve_path<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next().filter(|s| !s.is_empty())?;
    let mut cur = root.get(first)?;
    for seg in segments {
        if seg.is_empty() { return None; }
        match cur {
            Value::Object(map) => { cur = map.get(seg)?; }
            _ => return None,
        }
    }
    if cur.is_null() { None } else { Some(cur) }
}

/// Render a scalar JSON value as text. Objects, arrays, nulls and empty strings yield `None`.
pub fn render_scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Structured form of one paged list query, before serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// `$select` fields in emission order (no duplicates).
    pub select: Vec<String>,
    /// `$expand` lookups required by nested select paths.
    pub expand: Vec<String>,
    pub filter: Option<String>,
    pub order_by: Option<String>,
    /// `$top`
    pub page_size: Option<u32>,
    /// `$skip`
    pub skip: Option<u32>,
}

/// Normalized outcome of executing a [`PageDescriptor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub records: Vec<Record>,
    /// True iff the page came back full. The list endpoint does not report real
    /// pagination state, so a full last page still reports `true`.
    pub has_next: bool,
    pub total_count: Option<usize>,
}

impl PageResult {
    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

pub mod prelude {
    pub use super::{
        Author, CoreError, FieldMapping, FieldMappingEntry, PageDescriptor, PageResult, Record, Skill,
    };
}
