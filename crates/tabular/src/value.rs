//! Result rows returned by the store.

use rusqlite::types::ValueRef;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// One result row: column name to value, in SELECT order.
///
/// Serializes as a JSON object whose keys keep column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Vec<(String, Value)>);

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self(columns)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Convert a SQLite cell into JSON.
pub(crate) fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<{} bytes>", bytes.len())),
    }
}

/// Render a cell for prompt text.
pub(crate) fn display_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_serializes_in_column_order() {
        let row: Row = vec![
            ("status", json!("PAID")),
            ("amount", json!(120.5)),
            ("claims", json!(3)),
        ]
        .into_iter()
        .collect();

        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"status":"PAID","amount":120.5,"claims":3}"#);
        assert_eq!(row.get("amount"), Some(&json!(120.5)));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["status", "amount", "claims"]);
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(json_value(ValueRef::Null), Value::Null);
        assert_eq!(json_value(ValueRef::Integer(7)), json!(7));
        assert_eq!(json_value(ValueRef::Text(b"abc")), json!("abc"));
        assert_eq!(json_value(ValueRef::Real(f64::NAN)), Value::Null);
        assert_eq!(display_value(ValueRef::Null), "NULL");
        assert_eq!(display_value(ValueRef::Real(2.5)), "2.5");
    }
}
