//! Deserializers for the loose JSON shapes language models produce.
//!
//! Numbers arrive as `"$1,500,000"` or `"18%"`, lists as one bulleted
//! string, prose as nested objects. These helpers accept all of them and
//! leave the gaps to the normalizer.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reads a number from a JSON number or a numeric string.
pub(crate) fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(parse_number(&Value::deserialize(deserializer)?))
}

/// Reads prose, flattening arrays and objects into lines.
pub(crate) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_text(&Value::deserialize(deserializer)?))
}

/// Like [`text`], with blank values read as `None`.
pub(crate) fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let text = value_to_text(&Value::deserialize(deserializer)?);
    Ok(Some(text).filter(|t| !t.is_empty()))
}

/// Reads a list of strings from an array or a (possibly bulleted) string.
pub(crate) fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(value_to_list(&Value::deserialize(deserializer)?))
}

/// Reads a string map from an object; anything else becomes one `summary`
/// entry.
pub(crate) fn string_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), value_to_text(v)))
            .filter(|(_, v)| !v.is_empty())
            .collect(),
        other => {
            let text = value_to_text(&other);
            if text.is_empty() {
                BTreeMap::new()
            } else {
                BTreeMap::from([("summary".to_string(), text)])
            }
        }
    })
}

/// Reads a nested object, falling back to its default for any other shape.
pub(crate) fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    })
}

/// Reads an array of objects, skipping entries that are not objects.
pub(crate) fn object_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

/// Parses `"$1,500,000"`, `"18.5%"`, `"1.2M"` and `"250k"`.
fn parse_numeric_str(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let (body, scale) = match trimmed.chars().last()? {
        'k' | 'K' => (&trimmed[..trimmed.len() - 1], 1e3),
        'm' | 'M' => (&trimmed[..trimmed.len() - 1], 1e6),
        'b' | 'B' => (&trimmed[..trimmed.len() - 1], 1e9),
        _ => (trimmed, 1.0),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%' | ' ' | '€' | '£'))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v * scale)
}

pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(key, v)| (key, value_to_text(v)))
            .filter(|(_, t)| !t.is_empty())
            .map(|(key, t)| format!("{key}: {t}"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn value_to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|t| !t.is_empty())
            .collect(),
        Value::String(s) => s
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Null => Vec::new(),
        other => vec![value_to_text(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Lenient {
        #[serde(deserialize_with = "number")]
        amount: Option<f64>,
        #[serde(deserialize_with = "string_list")]
        items: Vec<String>,
        #[serde(deserialize_with = "text")]
        prose: String,
    }

    fn lenient(value: Value) -> Lenient {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(lenient(json!({"amount": 1200})).amount, Some(1200.0));
        assert_eq!(lenient(json!({"amount": "$1,500,000"})).amount, Some(1_500_000.0));
        assert_eq!(lenient(json!({"amount": "18.5%"})).amount, Some(18.5));
        assert_eq!(lenient(json!({"amount": "1.2M"})).amount, Some(1_200_000.0));
        assert_eq!(lenient(json!({"amount": "12-18 months"})).amount, None);
        assert_eq!(lenient(json!({"amount": null})).amount, None);
        assert_eq!(lenient(json!({})).amount, None);
    }

    #[test]
    fn test_lists() {
        assert_eq!(lenient(json!({"items": ["a", "", 3]})).items, vec!["a", "3"]);
        assert_eq!(
            lenient(json!({"items": "- first\n• second\n\n* third"})).items,
            vec!["first", "second", "third"]
        );
        assert!(lenient(json!({"items": null})).items.is_empty());
    }

    #[test]
    fn test_text_flattens_structures() {
        assert_eq!(lenient(json!({"prose": ["One.", "Two."]})).prose, "One.\nTwo.");
        assert_eq!(
            lenient(json!({"prose": {"Industry Analysis": "Growing.", "empty": ""}})).prose,
            "Industry Analysis: Growing."
        );
    }
}
