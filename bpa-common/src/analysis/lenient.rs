//! Field-level coercion for model-authored payloads
//!
//! Each adapter reads whatever JSON value is present and coerces it to the
//! field's type, so one oddly typed leaf defaults only that leaf. Used with
//! `#[serde(deserialize_with = "...")]` on the premium report structs.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ============================================================================
// Value coercion
// ============================================================================

/// Display text for any value; empty for null and empty containers
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(obj) => pairs_of(obj).join("; "),
        Value::Null => String::new(),
    }
}

fn pairs_of(obj: &Map<String, Value>) -> Vec<String> {
    obj.iter()
        .filter_map(|(key, value)| {
            let text = text_of(value);
            (!text.is_empty()).then(|| format!("{}: {}", key, text))
        })
        .collect()
}

/// Numeric amount from a number or text such as `"2 MSEK"`, `"500k"`,
/// `"1,5 mkr"`, `"$3.2M"`; 0 when nothing numeric is found
pub fn amount_of(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_amount(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Non-negative whole count
pub fn count_of(value: &Value) -> u64 {
    amount_of(value).round().max(0.0) as u64
}

pub fn parse_amount(text: &str) -> Option<f64> {
    let lower = text.trim().to_lowercase();
    let start = lower.find(|c: char| c.is_ascii_digit() || c == '-')?;
    let rest = &lower[start..];
    let end = rest
        .char_indices()
        .skip(1)
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | ',' | ' ' | '\u{a0}')))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());

    let digits: String = rest[..end].chars().filter(|c| !c.is_whitespace()).collect();
    let number = normalize_separators(digits.trim_end_matches(['.', ',']))?;
    let value: f64 = number.parse().ok()?;

    Some(value * magnitude(rest[end..].trim_start()))
}

/// `1,5` is a decimal comma; `1,000,000` and `1,000` are thousands groups
fn normalize_separators(digits: &str) -> Option<String> {
    if digits.is_empty() {
        return None;
    }
    let commas = digits.matches(',').count();
    let normalized = if digits.contains('.') || commas > 1 {
        digits.replace(',', "")
    } else if commas == 1 {
        let after = digits.len() - digits.find(',').unwrap_or(0) - 1;
        if after == 3 {
            digits.replace(',', "")
        } else {
            digits.replace(',', ".")
        }
    } else {
        digits.to_string()
    };
    Some(normalized)
}

fn magnitude(suffix: &str) -> f64 {
    const BILLION: [&str; 8] = [
        "b", "bn", "billion", "billions", "mdr", "mdkr", "miljard", "miljarder",
    ];
    const MILLION: [&str; 11] = [
        "m", "mn", "mio", "million", "millions", "msek", "mkr", "meur", "musd", "miljon",
        "miljoner",
    ];
    const THOUSAND: [&str; 7] = ["k", "ksek", "kkr", "tkr", "tsek", "thousand", "tusen"];

    let word: String = suffix.chars().take_while(|c| c.is_alphabetic()).collect();
    let word = word.as_str();
    if BILLION.contains(&word) {
        1e9
    } else if MILLION.contains(&word) {
        1e6
    } else if THOUSAND.contains(&word) {
        1e3
    } else {
        1.0
    }
}

/// List of strings from an array, a single string, or an object
/// (rendered as `key: value` entries)
pub fn string_list_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(text_of).filter(|s| !s.is_empty()).collect(),
        Value::Object(obj) => pairs_of(obj),
        Value::Null => Vec::new(),
        other => {
            let text = text_of(other);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    }
}

/// Key → text map from an object, or from an array of
/// `{name|category|purpose, share|amount|percentage|value}` rows
pub fn string_map_of(value: &Value) -> BTreeMap<String, String> {
    const KEY_FIELDS: [&str; 4] = ["name", "category", "purpose", "label"];
    const VALUE_FIELDS: [&str; 5] = ["share", "amount", "percentage", "percent", "value"];

    match value {
        Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| (k.clone(), text_of(v)))
            .filter(|(_, v)| !v.is_empty())
            .collect(),
        Value::Array(rows) => rows
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|row| {
                let key = KEY_FIELDS.iter().find_map(|k| row.get(*k)).map(text_of)?;
                let value = VALUE_FIELDS.iter().find_map(|k| row.get(*k)).map(text_of)?;
                (!key.is_empty() && !value.is_empty()).then_some((key, value))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Elements of an array (or a lone object) that deserialize as `T`
pub fn items_of<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        Value::Object(_) => serde_json::from_value(value.clone())
            .map(|item| vec![item])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

// ============================================================================
// serde adapters
// ============================================================================

pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(|v| text_of(&v))
}

pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Value::deserialize(deserializer).map(|v| amount_of(&v))
}

pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Value::deserialize(deserializer).map(|v| count_of(&v))
}

pub fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Value::deserialize(deserializer).map(|v| count_of(&v).min(u64::from(u32::MAX)) as u32)
}

pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Value::deserialize(deserializer).map(|v| string_list_of(&v))
}

pub fn string_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    Value::deserialize(deserializer).map(|v| string_map_of(&v))
}

pub fn items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Value::deserialize(deserializer).map(|v| items_of(&v))
}

/// Object entries whose values deserialize as `T`
pub fn entries<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(obj) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(obj
        .into_iter()
        .filter_map(|(k, v)| serde_json::from_value(v).ok().map(|item| (k, item)))
        .collect())
}

/// Nested struct, or its default when the value has the wrong shape
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
