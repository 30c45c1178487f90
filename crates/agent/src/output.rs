//! Extraction of structured values from free-form completions.
//!
//! Each extractor walks a fixed ladder of patterns and returns `None` when no
//! rung matches. A failed parse is a value, not an error.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").ok());
static LAZY_OBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").ok());
static GREEDY_OBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").ok());
static FENCED_SQL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)```sql\b\s*(.*?)\s*```").ok());
static FENCED_ANY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*[ \t]*\n)?(.*?)\s*```").ok());

/// Find a JSON object in a completion.
///
/// Ladder: a fenced ```` ```json ```` block, then the first shortest `{...}`
/// span that parses, then the widest `{...}` span.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    if let Some(block) = first_capture(&FENCED_JSON, text) {
        if let Some(object) = parse_object(block) {
            return Some(object);
        }
    }

    if let Some(re) = LAZY_OBJECT.as_ref() {
        if let Some(object) = re.find_iter(text).find_map(|m| parse_object(m.as_str())) {
            return Some(object);
        }
    }

    GREEDY_OBJECT
        .as_ref()
        .and_then(|re| re.find(text))
        .and_then(|m| parse_object(m.as_str()))
}

/// Find a SQL statement in a completion.
///
/// Ladder: a fenced ```` ```sql ```` block, then any fenced block, then the
/// whole completion. Blank results are rejected.
pub fn extract_sql(text: &str) -> Option<String> {
    let candidate = first_capture(&FENCED_SQL, text)
        .or_else(|| first_capture(&FENCED_ANY, text))
        .unwrap_or(text)
        .trim();

    (!candidate.is_empty()).then(|| candidate.to_string())
}

fn first_capture<'t>(pattern: &LazyLock<Option<Regex>>, text: &'t str) -> Option<&'t str> {
    pattern
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}
