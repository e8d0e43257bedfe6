//! Canonical forms for individually encoded fields.
//!
//! Compose documents accept several encodings for the same data. These
//! helpers reduce each encoding to one representation without dropping keys.

use composure_common::error::{ComposeError, Result};
use serde_json::Value;

use crate::model::KeyValues;

/// Splits a `KEY=VALUE` entry at the first `=`.
///
/// Key and value are trimmed; an entry without `=` yields an empty value.
pub fn split_key_value(entry: &str) -> (String, String) {
    match entry.split_once('=') {
        Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
        None => (entry.trim().to_string(), String::new()),
    }
}

/// Renders a scalar as text. `null` becomes the empty string.
///
/// Returns `None` for arrays and objects.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Normalizes a mapping or a list of `KEY=VALUE` strings into a mapping.
///
/// Later list entries overwrite earlier ones with the same key.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] for entries that are not scalars,
/// for empty keys, and for any other encoding of the field.
pub fn key_values(field: &str, value: &Value) -> Result<KeyValues> {
    let mut out = KeyValues::new();
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, raw) in map {
                let text = scalar_to_string(raw).ok_or_else(|| {
                    ComposeError::validation(format!(
                        "Invalid value for '{key}' in {field}: expected a scalar"
                    ))
                })?;
                let _ = out.insert(key.clone(), text.trim().to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                let entry = match item {
                    Value::Null | Value::Array(_) | Value::Object(_) => {
                        return Err(ComposeError::validation(format!(
                            "Invalid entry in {field}: expected a KEY=VALUE string, got {item}"
                        )));
                    }
                    scalar => scalar_to_string(scalar).unwrap_or_default(),
                };
                let (key, value) = split_key_value(&entry);
                if key.is_empty() {
                    return Err(ComposeError::validation(format!(
                        "Invalid entry '{entry}' in {field}: missing key"
                    )));
                }
                let _ = out.insert(key, value);
            }
        }
        other => {
            return Err(ComposeError::validation(format!(
                "Invalid {field}: expected a mapping or a list, got {other}"
            )));
        }
    }
    Ok(out)
}

/// Normalizes `extra_hosts` into a list of `host:ip` strings.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] for non-scalar entries or any other
/// encoding of the field.
pub fn extra_hosts(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .iter()
            .map(|(host, ip)| {
                scalar_to_string(ip)
                    .map(|ip| format!("{host}:{ip}"))
                    .ok_or_else(|| {
                        ComposeError::validation(format!(
                            "Invalid address for extra host '{host}'"
                        ))
                    })
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(ToString::to_string).ok_or_else(|| {
                    ComposeError::validation(format!(
                        "Invalid extra_hosts entry {item}: expected a host:ip string"
                    ))
                })
            })
            .collect(),
        other => Err(ComposeError::validation(format!(
            "Invalid extra_hosts: expected a mapping or a list, got {other}"
        ))),
    }
}

/// Coerces every port entry to its string representation.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] if `ports` is not a list or holds
/// entries that are neither strings nor numbers.
pub fn ports(value: &Value) -> Result<Vec<String>> {
    let items = string_list_source("ports", value)?;
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(ComposeError::validation(format!(
                "Invalid port {other}: expected a string or a number"
            ))),
        })
        .collect()
}

/// Reads a list of strings.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] if the value is not a list of strings.
pub fn string_list(field: &str, value: &Value) -> Result<Vec<String>> {
    string_list_source(field, value)?
        .iter()
        .map(|item| {
            item.as_str().map(ToString::to_string).ok_or_else(|| {
                ComposeError::validation(format!(
                    "Invalid entry {item} in {field}: expected a string"
                ))
            })
        })
        .collect()
}

/// Reads a field that may be a single string or a list of strings.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] for any other encoding.
pub fn string_or_list(field: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        other => string_list(field, other),
    }
}

fn string_list_source<'a>(field: &str, value: &'a Value) -> Result<&'a [Value]> {
    match value {
        Value::Null => Ok(&[]),
        Value::Array(items) => Ok(items),
        other => Err(ComposeError::validation(format!(
            "Invalid {field}: expected a list, got {other}"
        ))),
    }
}

/// Reads an optional string field.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] if the value is neither `null` nor a string.
pub fn optional_string(field: &str, value: Option<&Value>) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ComposeError::validation(format!(
            "Invalid {field}: expected a string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_entries_split_at_first_equals() {
        let env = key_values("environment", &json!(["SOME_VAR=some=value"])).expect("normalize");
        assert_eq!(env.get("SOME_VAR").map(String::as_str), Some("some=value"));
    }

    #[test]
    fn list_entries_are_trimmed_and_default_to_empty() {
        let env = key_values("environment", &json!([" A = 1 ", "B"])).expect("normalize");
        assert_eq!(env.get("A").map(String::as_str), Some("1"));
        assert_eq!(env.get("B").map(String::as_str), Some(""));
    }

    #[test]
    fn mapping_values_are_stringified() {
        let env = key_values(
            "environment",
            &json!({"PORT": 8080, "DEBUG": true, "EMPTY": null, "NAME": "  app "}),
        )
        .expect("normalize");
        assert_eq!(env.get("PORT").map(String::as_str), Some("8080"));
        assert_eq!(env.get("DEBUG").map(String::as_str), Some("true"));
        assert_eq!(env.get("EMPTY").map(String::as_str), Some(""));
        assert_eq!(env.get("NAME").map(String::as_str), Some("app"));
    }

    #[test]
    fn mapping_preserves_key_order() {
        let env = key_values("labels", &json!({"z": "1", "a": "2"})).expect("normalize");
        let keys: Vec<&String> = env.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn nested_values_are_rejected() {
        let err = key_values("environment", &json!({"A": {"nested": 1}})).unwrap_err();
        assert!(err.to_string().contains("'A'"), "got: {err}");
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = key_values("environment", &json!(["=value"])).unwrap_err();
        assert!(err.to_string().contains("missing key"), "got: {err}");
    }

    #[test]
    fn extra_hosts_mapping_becomes_list() {
        let hosts = extra_hosts(&json!({"db": "10.0.0.2", "cache": "10.0.0.3"})).expect("hosts");
        assert_eq!(hosts, vec!["db:10.0.0.2", "cache:10.0.0.3"]);
    }

    #[test]
    fn extra_hosts_list_is_kept() {
        let hosts = extra_hosts(&json!(["db:10.0.0.2"])).expect("hosts");
        assert_eq!(hosts, vec!["db:10.0.0.2"]);
    }

    #[test]
    fn numeric_ports_become_strings() {
        let ports = ports(&json!([80, "443:443", 8080])).expect("ports");
        assert_eq!(ports, vec!["80", "443:443", "8080"]);
    }

    #[test]
    fn string_or_list_accepts_both() {
        assert_eq!(string_or_list("env_file", &json!(".env")).expect("string"), vec![".env"]);
        assert_eq!(
            string_or_list("env_file", &json!(["a.env", "b.env"])).expect("list"),
            vec!["a.env", "b.env"]
        );
        assert!(string_or_list("env_file", &json!(3)).is_err());
    }
}
