//! Field mapping: declarative source-path → destination-field table and the remap transform.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{CoreError, Record};

/// One mapping row, in the host configuration shape `{name, field, value, searchable}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMappingEntry {
    /// Label shown in configuration UIs.
    #[serde(rename = "name")]
    pub display_name: String,
    /// Key written in the remapped output.
    #[serde(rename = "field")]
    pub destination: String,
    /// Path read from the source record, e.g. `Title` or `Author.Title`.
    #[serde(rename = "value")]
    pub source_path: String,
    #[serde(default)]
    pub searchable: bool,
}

impl FieldMappingEntry {
    pub fn new(display_name: &str, destination: &str, source_path: &str, searchable: bool) -> Self {
        Self {
            display_name: display_name.to_string(),
            destination: destination.to_string(),
            source_path: source_path.to_string(),
            searchable,
        }
    }
}

/// Ordered mapping table. Supplied by configuration and never mutated by the query path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: Vec<FieldMappingEntry>,
}

impl FieldMapping {
    pub fn new(entries: Vec<FieldMappingEntry>) -> Self { Self { entries } }

    /// Built-in mapping for skill cards.
    pub fn skills_default() -> Self {
        Self::new(vec![
            FieldMappingEntry::new("Title", "title", "Title", true),
            FieldMappingEntry::new("Description", "description", "Description", true),
            FieldMappingEntry::new("Category", "category", "Category", true),
            FieldMappingEntry::new("Level", "level", "Level", false),
            FieldMappingEntry::new("Author", "author", "Author.Title", false),
        ])
    }

    /// Parse the host JSON shape: `[{"name":..,"field":..,"value":..,"searchable":..}]`.
    pub fn from_json(s: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn entries(&self) -> &[FieldMappingEntry] { &self.entries }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldMappingEntry> { self.entries.iter() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entries eligible for the free-text search clause (searchable with a non-empty source path).
    pub fn searchable(&self) -> SmallVec<[&FieldMappingEntry; 8]> {
        self.entries
            .iter()
            .filter(|e| e.searchable && !e.source_path.trim().is_empty())
            .collect()
    }

    /// Copy mapped fields from `record` into a new record keyed by destination names.
    ///
    /// Unmapped fields are dropped. A source path that does not resolve leaves the
    /// destination absent; when two rows share a destination the later row wins,
    /// including when it resolves to nothing.
    pub fn remap(&self, record: &Record) -> Record {
        let mut out = Record::new();
        for e in self.entries.iter() {
            match record.resolve(&e.source_path) {
                Some(v) => { out.insert(e.destination.clone(), v.clone()); }
                None => { out.remove(&e.destination); }
            }
        }
        out
    }
}

impl FromIterator<FieldMappingEntry> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = FieldMappingEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FieldMapping {
    type Item = &'a FieldMappingEntry;
    type IntoIter = std::slice::Iter<'a, FieldMappingEntry>;
    fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}
