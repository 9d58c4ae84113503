//! Roster query builder: turns search parameters plus a field mapping into a
//! [`PageDescriptor`], and serializes descriptors into list query strings.
//!
//! The caller filter is opaque and passed through, checked only for balanced
//! grouping. The free-text term is always embedded as an escaped string literal.

#![forbid(unsafe_code)]

use roster_core::skill::{AUTHOR_SELECT, SKILL_SELECT};
use roster_core::{FieldMapping, PageDescriptor};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod odata;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("filter has unbalanced parentheses or an unterminated string: {0}")]
    UnbalancedFilter(String),
    #[error("invalid field path: {0:?}")]
    InvalidFieldPath(String),
}

/// Caller-supplied search parameters. Empty strings behave as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub filter: Option<String>,
    pub order_by: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub select_fields: Vec<String>,
    pub page_size: Option<u32>,
    /// 1-based page number.
    pub page_number: Option<u32>,
}

/// Select/expand/order used when the caller does not provide them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefaults {
    pub select: Vec<String>,
    /// Always appended to a caller select list.
    pub extra_select: Vec<String>,
    pub expand: Vec<String>,
    pub order_by: String,
}

impl QueryDefaults {
    pub fn skills() -> Self {
        Self {
            select: SKILL_SELECT.iter().map(|s| s.to_string()).collect(),
            extra_select: AUTHOR_SELECT.iter().map(|s| s.to_string()).collect(),
            expand: vec!["Author".to_string()],
            order_by: "Modified desc".to_string(),
        }
    }
}

impl Default for QueryDefaults {
    fn default() -> Self { Self::skills() }
}

// Whitespace-only input counts as absent: a blank search box never adds a clause.
fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|v| !v.trim().is_empty())
}

/// Stateless builder; the same inputs always produce the same descriptor.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    defaults: QueryDefaults,
}

impl QueryBuilder {
    pub fn new(defaults: QueryDefaults) -> Self { Self { defaults } }

    pub fn defaults(&self) -> &QueryDefaults { &self.defaults }

    pub fn build(&self, params: &QueryParams, mapping: &FieldMapping) -> Result<PageDescriptor, QueryError> {
        let select = self.select_clause(&params.select_fields)?;
        let filter = Self::filter_clause(non_empty(&params.filter), non_empty(&params.search), mapping)?;
        let order_by = non_empty(&params.order_by).unwrap_or(&self.defaults.order_by).to_string();

        let page_size = params.page_size.filter(|n| *n > 0);
        let skip = match (page_size, params.page_number) {
            (Some(size), Some(page)) if page > 1 => Some((page - 1).saturating_mul(size)),
            _ => None,
        };

        metrics::counter!("query_build_total", 1u64);
        debug!(select = select.len(), filter = ?filter, order_by = %order_by, page_size = ?page_size, skip = ?skip, "query: built");
        Ok(PageDescriptor {
            select,
            expand: self.defaults.expand.clone(),
            filter,
            order_by: Some(order_by),
            page_size,
            skip,
        })
    }

    fn select_clause(&self, fields: &[String]) -> Result<Vec<String>, QueryError> {
        let requested: Vec<&String> = fields.iter().filter(|f| !f.trim().is_empty()).collect();
        let source: Vec<&String> = if requested.is_empty() {
            self.defaults.select.iter().collect()
        } else {
            requested.into_iter().chain(self.defaults.extra_select.iter()).collect()
        };
        let mut out: Vec<String> = Vec::with_capacity(source.len());
        for f in source {
            let p = odata::select_field(f)?;
            if !out.contains(&p) { out.push(p); }
        }
        Ok(out)
    }

    fn filter_clause(base: Option<&str>, search: Option<&str>, mapping: &FieldMapping) -> Result<Option<String>, QueryError> {
        if let Some(b) = base { odata::check_filter(b)?; }

        let mut predicates: Vec<String> = Vec::new();
        if let Some(term) = search {
            let literal = odata::string_literal(term);
            for e in mapping.searchable() {
                let field = odata::field_path(&e.source_path)?;
                predicates.push(format!("substringof({},{})", literal, field));
            }
        }

        let search_clause = if predicates.is_empty() { None } else { Some(format!("({})", predicates.join(" or "))) };
        Ok(match (base, search_clause) {
            (Some(b), Some(s)) => Some(format!("({}) and {}", b, s)),
            (Some(b), None) => Some(b.to_string()),
            (None, Some(s)) => Some(s),
            (None, None) => None,
        })
    }
}

/// Build with the skill defaults.
pub fn build_query(params: &QueryParams, mapping: &FieldMapping) -> Result<PageDescriptor, QueryError> {
    QueryBuilder::default().build(params, mapping)
}

/// Ordered `(name, value)` query parameters: `$select`, `$expand`, `$filter`, `$orderby`, `$top`, `$skip`.
pub fn query_pairs(d: &PageDescriptor) -> Vec<(&'static str, String)> {
    let mut out: Vec<(&'static str, String)> = Vec::with_capacity(6);
    if !d.select.is_empty() { out.push(("$select", d.select.join(","))); }
    if !d.expand.is_empty() { out.push(("$expand", d.expand.join(","))); }
    if let Some(f) = &d.filter { out.push(("$filter", f.clone())); }
    if let Some(o) = &d.order_by { out.push(("$orderby", o.clone())); }
    if let Some(t) = d.page_size { out.push(("$top", t.to_string())); }
    if let Some(s) = d.skip { out.push(("$skip", s.to_string())); }
    out
}

/// Percent-encoded query string (without the leading `?`).
pub fn to_query_string(d: &PageDescriptor) -> String {
    query_pairs(d)
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
        .collect::<Vec<_>>()
        .join("&")
}
