//! Typed reads of primitive entry fields. Missing or mistyped values fall back
//! to a default instead of failing.

use chrono::NaiveDate;
use tracing::debug;

use crate::{
    envelope::Entry,
    rich_text::{self, Document},
};

pub fn opt_text(entry: &Entry, name: &str) -> Option<String> {
    entry
        .field(name)
        .and_then(|value| value.as_str())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

pub fn text(entry: &Entry, name: &str) -> String {
    opt_text(entry, name).unwrap_or_default()
}

pub fn texts(entry: &Entry, name: &str) -> Vec<String> {
    entry
        .field(name)
        .and_then(|value| value.as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|value| value.as_str())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

pub fn flag(entry: &Entry, name: &str) -> bool {
    entry
        .field(name)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

pub fn integer(entry: &Entry, name: &str) -> Option<i64> {
    entry.field(name).and_then(|value| value.as_i64())
}

/// Reads a date or datetime field. Only the calendar date is kept, as written
/// by the editor, regardless of the offset of a datetime value.
pub fn date(entry: &Entry, name: &str) -> Option<NaiveDate> {
    let raw = entry.field(name)?.as_str()?;
    let parsed = raw
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok());
    if parsed.is_none() {
        debug!(id = entry.id(), field = name, raw, "unparsable date");
    }
    parsed
}

/// Formats a date the way pages display it, e.g. `March 5, 2024`.
pub fn display_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

pub fn document(entry: &Entry, name: &str) -> Option<Document> {
    let document = Document::from_value(entry.field(name)?);
    if document.is_none() {
        debug!(id = entry.id(), field = name, "malformed rich text");
    }
    document
}

/// Renders a rich-text field to HTML. Plain string values are escaped and
/// wrapped in a paragraph.
pub fn rich_text(entry: &Entry, name: &str) -> String {
    match entry.field(name) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => {
            format!("<p>{}</p>", html_escape::encode_text(s))
        }
        _ => rich_text::render(document(entry, name).as_ref()),
    }
}
