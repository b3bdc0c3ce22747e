//! Lenient field deserializers for backend records
//!
//! The REST backend is loosely typed: references may be bare ids, populated
//! objects or `null`, numbers sometimes arrive as strings, and enum values may
//! be unknown. These helpers absorb such variations into defaults so that one
//! malformed field never rejects an otherwise usable record.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::EntityRef;

/// Deserialize any JSON value into `T`, falling back to `T::default()`
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

/// Deserialize a string, accepting numbers and treating everything else as empty
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Deserialize a number, accepting numeric strings; anything else is 0
pub(crate) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if parsed.is_finite() { parsed } else { 0.0 })
}

/// Deserialize an "is active" style flag; missing or malformed values count as active
pub(crate) fn flag_default_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => sitetrack_common::parse_bool_flag(&s).unwrap_or(true),
        _ => true,
    })
}

/// Default used alongside [`flag_default_true`] for absent fields
pub(crate) fn default_true() -> bool {
    true
}

/// Deserialize a foreign reference
pub(crate) fn entity_ref<'de, D>(deserializer: D) -> Result<Option<EntityRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(EntityRef::from_value))
}

/// Deserialize a timestamp given as RFC 3339 or as a plain date
pub(crate) fn datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

/// Deserialize a list of strings, dropping non-string entries
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    sitetrack_common::parse_date(s.trim())
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "number")]
        amount: f64,
        #[serde(default, deserialize_with = "string")]
        label: String,
        #[serde(default, deserialize_with = "entity_ref")]
        owner: Option<EntityRef>,
        #[serde(default, deserialize_with = "datetime")]
        when: Option<DateTime<Utc>>,
        #[serde(default = "default_true", deserialize_with = "flag_default_true")]
        active: bool,
        #[serde(default, deserialize_with = "string_list")]
        images: Vec<String>,
    }

    fn decode(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let p = decode("{}");
        assert!(p.amount.abs() < f64::EPSILON);
        assert!(p.label.is_empty());
        assert!(p.owner.is_none());
        assert!(p.when.is_none());
        assert!(p.active);
        assert!(p.images.is_empty());
    }

    #[test]
    fn test_null_fields_take_defaults() {
        let p = decode(
            r#"{"amount": null, "label": null, "owner": null, "when": null, "active": null, "images": null}"#,
        );
        assert!(p.amount.abs() < f64::EPSILON);
        assert!(p.owner.is_none());
        assert!(p.active);
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let p = decode(r#"{"amount": "1250.5"}"#);
        assert!((p.amount - 1250.5).abs() < f64::EPSILON);

        let p = decode(r#"{"amount": "lots"}"#);
        assert!(p.amount.abs() < f64::EPSILON);
    }

    #[test]
    fn test_reference_shapes() {
        let bare = decode(r#"{"owner": "u1"}"#);
        assert_eq!(bare.owner, Some(EntityRef::new("u1")));

        let populated = decode(r#"{"owner": {"_id": "u2", "name": "Dana"}}"#);
        assert_eq!(populated.owner, Some(EntityRef::named("u2", "Dana")));

        let malformed = decode(r#"{"owner": 17}"#);
        assert!(malformed.owner.is_none());

        let empty = decode(r#"{"owner": ""}"#);
        assert!(empty.owner.is_none());
    }

    #[test]
    fn test_timestamps() {
        let full = decode(r#"{"when": "2024-05-01T08:30:00.000Z"}"#);
        assert_eq!(
            full.when.unwrap().to_rfc3339(),
            "2024-05-01T08:30:00+00:00"
        );

        let date_only = decode(r#"{"when": "2024-05-01"}"#);
        assert_eq!(
            date_only.when.unwrap().to_rfc3339(),
            "2024-05-01T00:00:00+00:00"
        );

        let us_date = decode(r#"{"when": "05/31/2024"}"#);
        assert_eq!(
            us_date.when.unwrap().to_rfc3339(),
            "2024-05-31T00:00:00+00:00"
        );

        let garbage = decode(r#"{"when": "yesterday"}"#);
        assert!(garbage.when.is_none());
    }

    #[test]
    fn test_flags_and_lists() {
        let p = decode(r#"{"active": false, "images": ["a.png", 3, "b.png"]}"#);
        assert!(!p.active);
        assert_eq!(p.images, vec!["a.png".to_string(), "b.png".to_string()]);

        let p = decode(r#"{"active": "no", "label": 42}"#);
        assert!(!p.active);
        assert_eq!(p.label, "42");
    }
}
