//! Lenient field deserializers for collaborator-supplied records.
//!
//! Records arrive already fetched and shaped by other parts of the portal.
//! A field whose JSON type deviates from the expected shape resolves to
//! "absent" instead of failing the whole record, so the template compiler
//! can fill in its documented default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Text field: strings are trimmed (blank → absent), numbers are stringified,
/// every other JSON type is absent.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_of(&value))
}

/// Ordinal id: integer or integer-looking string.
pub(crate) fn ordinal<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Non-negative day count (medication duration).
pub(crate) fn days<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64().and_then(|d| u32::try_from(d).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Ordered list of structured rows. Accepts a JSON array, or a string that
/// itself holds a JSON array (the backend ships lab results that way).
/// Elements that fail to deserialize keep their slot as a default row so
/// the order of the remaining rows is preserved.
pub(crate) fn rows<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

/// Tag list: array of scalars, or a comma-separated string.
pub(crate) fn tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(text_of).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "text")]
        name: Option<String>,
        #[serde(default, deserialize_with = "ordinal")]
        id: Option<i64>,
        #[serde(default, deserialize_with = "days")]
        duration: Option<u32>,
        #[serde(default, deserialize_with = "tags")]
        labels: Vec<String>,
        #[serde(default, deserialize_with = "rows")]
        items: Vec<Item>,
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Item {
        #[serde(default)]
        label: String,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn text_trims_and_drops_blank() {
        assert_eq!(probe(r#"{"name": "  Dr. Rao "}"#).name.as_deref(), Some("Dr. Rao"));
        assert!(probe(r#"{"name": "   "}"#).name.is_none());
    }

    #[test]
    fn text_stringifies_numbers_and_ignores_other_types() {
        assert_eq!(probe(r#"{"name": 16.4}"#).name.as_deref(), Some("16.4"));
        assert!(probe(r#"{"name": {"first": "x"}}"#).name.is_none());
        assert!(probe(r#"{"name": null}"#).name.is_none());
    }

    #[test]
    fn ordinal_accepts_numeric_strings() {
        assert_eq!(probe(r#"{"id": 42}"#).id, Some(42));
        assert_eq!(probe(r#"{"id": " 7 "}"#).id, Some(7));
        assert_eq!(probe(r#"{"id": "abc"}"#).id, None);
    }

    #[test]
    fn days_rejects_negative() {
        assert_eq!(probe(r#"{"duration": 5}"#).duration, Some(5));
        assert_eq!(probe(r#"{"duration": -3}"#).duration, None);
    }

    #[test]
    fn tags_split_comma_string() {
        let p = probe(r#"{"labels": "CBC, Lipid Profile ,,"}"#);
        assert_eq!(p.labels, vec!["CBC", "Lipid Profile"]);
        let p = probe(r#"{"labels": ["HbA1c", 3, null]}"#);
        assert_eq!(p.labels, vec!["HbA1c", "3"]);
    }

    #[test]
    fn rows_keep_slot_for_malformed_element() {
        let p = probe(r#"{"items": [{"label": "a"}, 12, {"label": "c"}]}"#);
        assert_eq!(p.items.len(), 3);
        assert_eq!(p.items[1], Item::default());
        assert_eq!(p.items[2].label, "c");
    }

    #[test]
    fn rows_accept_json_encoded_string() {
        let p = probe(r#"{"items": "[{\"label\": \"x\"}]"}"#);
        assert_eq!(p.items, vec![Item { label: "x".into() }]);
        assert!(probe(r#"{"items": "not json"}"#).items.is_empty());
    }
}
