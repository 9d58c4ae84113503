//! Roster view adapter: pure mapping from a fetched page plus field mapping to
//! display-ready skill cards. No state, no styling.

#![forbid(unsafe_code)]

use std::fmt::{self, Write};

use roster_core::{FieldMapping, PageResult, Record};
use serde::{Deserialize, Serialize};

pub const NO_RESULTS_MESSAGE: &str = "No results found";

/// Display attributes of one skill card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCard {
    pub id: Option<u64>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub author: Option<String>,
    /// Raw `Modified` timestamp as returned by the list.
    pub modified: Option<String>,
}

/// Resolve each attribute as mapped value, falling back to the record's own field.
pub fn card_for(record: &Record, mapping: &FieldMapping) -> SkillCard {
    let mapped = mapping.remap(record);
    let pick = |dest: &str, raw: &str| mapped.resolve_text(dest).or_else(|| record.resolve_text(raw));
    SkillCard {
        id: record.id(),
        title: pick("title", "Title").unwrap_or_default(),
        description: pick("description", "Description"),
        category: pick("category", "Category"),
        level: pick("level", "Level"),
        author: pick("author", "Author.Title"),
        modified: record.resolve_text("Modified"),
    }
}

pub fn cards(page: &PageResult, mapping: &FieldMapping) -> Vec<SkillCard> {
    page.records.iter().map(|r| card_for(r, mapping)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    #[default]
    Cards,
    /// Pretty JSON of the fetched records.
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOptions {
    pub layout: Layout,
    pub show_results_count: bool,
    /// Render nothing (instead of the no-results message) for an empty page.
    pub show_blank: bool,
}

impl Default for ViewOptions {
    fn default() -> Self { Self { layout: Layout::Cards, show_results_count: true, show_blank: false } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultsView {
    Cards { result_count: Option<usize>, cards: Vec<SkillCard>, has_next: bool },
    NoResults(String),
    Blank,
    Debug(String),
}

pub fn render_results(page: &PageResult, mapping: &FieldMapping, opts: ViewOptions) -> Result<ResultsView, serde_json::Error> {
    if opts.layout == Layout::Debug {
        return Ok(ResultsView::Debug(serde_json::to_string_pretty(&page.records)?));
    }
    if page.is_empty() {
        return Ok(if opts.show_blank { ResultsView::Blank } else { ResultsView::NoResults(NO_RESULTS_MESSAGE.to_string()) });
    }
    let result_count = if opts.show_results_count { Some(page.total_count.unwrap_or(page.records.len())) } else { None };
    Ok(ResultsView::Cards { result_count, cards: cards(page, mapping), has_next: page.has_next })
}

/// Compact age (`3d4h`, `5h2m`, `7m`, `12s`) of an RFC 3339 timestamp relative to `now_ts`.
pub fn render_age(ts: &str, now_ts: i64) -> String {
    let then = match chrono::DateTime::parse_from_rfc3339(ts) { Ok(dt) => dt.timestamp(), Err(_) => return "-".to_string() };
    let mut secs = (now_ts - then).max(0) as u64;
    let days = secs / 86_400; secs %= 86_400;
    let hours = secs / 3600; secs %= 3600;
    let mins = secs / 60; secs %= 60;
    if days > 0 { format!("{}d{}h", days, hours) }
    else if hours > 0 { format!("{}h{}m", hours, mins) }
    else if mins > 0 { format!("{}m", mins) }
    else { format!("{}s", secs) }
}

impl SkillCard {
    /// Text block for one card; `now_ts` (unix seconds) anchors the age line.
    pub fn render(&self, now_ts: i64) -> String {
        let mut out = String::new();
        let _ = self.write_to(&mut out, now_ts);
        out
    }

    fn write_to(&self, f: &mut impl Write, now_ts: i64) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if let Some(d) = &self.description { writeln!(f, "  {}", d)?; }
        if let Some(c) = &self.category { writeln!(f, "  Category: {}", c)?; }
        if let Some(l) = &self.level { writeln!(f, "  Level: {}", l)?; }
        if let Some(a) = &self.author { writeln!(f, "  Created by: {}", a)?; }
        if let Some(m) = &self.modified { writeln!(f, "  Updated: {} ago", render_age(m, now_ts))?; }
        Ok(())
    }
}

impl ResultsView {
    /// Human text for the whole view, ages relative to `now_ts`.
    pub fn render(&self, now_ts: i64) -> String {
        let mut out = String::new();
        let _ = self.write_to(&mut out, now_ts);
        out
    }

    fn write_to(&self, f: &mut impl Write, now_ts: i64) -> fmt::Result {
        match self {
            ResultsView::Cards { result_count, cards, has_next } => {
                if let Some(n) = result_count { writeln!(f, "{} result(s)", n)?; writeln!(f)?; }
                for c in cards { c.write_to(f, now_ts)?; writeln!(f)?; }
                if *has_next { writeln!(f, "(more results may be available: request the next page)")?; }
                Ok(())
            }
            ResultsView::NoResults(msg) => writeln!(f, "{}", msg),
            ResultsView::Blank => Ok(()),
            ResultsView::Debug(json) => writeln!(f, "{}", json),
        }
    }
}
