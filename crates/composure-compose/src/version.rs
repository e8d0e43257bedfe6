//! Version detection and preflight coercion of raw documents.
//!
//! Raw input is loosely typed: the version may be missing, numeric, or a
//! string, and network/volume entries may be `null`. This module turns that
//! input into a document the schema validator can check.

use composure_common::error::{ComposeError, Result};
use composure_common::types::SchemaVersion;
use serde_json::{Map, Value};

/// Determines the schema version a raw document declares.
///
/// A missing `version` key means the oldest supported format. Numbers are
/// coerced to their textual form before lookup, so `2` and `"2"` are the
/// same version.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] if the document is not a mapping, and
/// [`ComposeError::UnsupportedVersion`] if the tag is unknown.
pub fn resolve_version(document: &Value) -> Result<SchemaVersion> {
    let Value::Object(map) = document else {
        return Err(ComposeError::validation(
            "Composition must be a mapping at the top level",
        ));
    };
    let version = match map.get("version") {
        None => return Ok(SchemaVersion::V1),
        Some(tag) => version_tag(tag)?,
    };
    tracing::debug!(version = %version, "resolved declared version");
    SchemaVersion::from_tag(&version)
}

fn version_tag(value: &Value) -> Result<String> {
    match value {
        Value::String(tag) => Ok(tag.clone()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(ComposeError::UnsupportedVersion {
            version: other.to_string(),
        }),
    }
}

/// Applies the coercions that must happen before schema validation.
///
/// - `version` is rewritten as text, or dropped for the legacy format whose
///   top level is the service map.
/// - `null` entries under `networks` and `volumes` become empty mappings, as
///   does a `null` section itself.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] if the document is not a mapping.
pub fn preflight(version: SchemaVersion, document: Value) -> Result<Value> {
    let Value::Object(mut map) = document else {
        return Err(ComposeError::validation(
            "Composition must be a mapping at the top level",
        ));
    };

    match version {
        SchemaVersion::V1 => {
            let _ = map.shift_remove("version");
        }
        SchemaVersion::V2_0 | SchemaVersion::V2_1 => {
            let _ = map.insert("version".into(), Value::from(version.as_str()));
            for section in ["networks", "volumes"] {
                if let Some(entries) = map.get_mut(section) {
                    coerce_null_entries(entries);
                }
            }
        }
    }
    Ok(Value::Object(map))
}

fn coerce_null_entries(section: &mut Value) {
    match section {
        Value::Null => *section = Value::Object(Map::new()),
        Value::Object(entries) => {
            for entry in entries.values_mut() {
                if entry.is_null() {
                    *entry = Value::Object(Map::new());
                }
            }
        }
        _ => {}
    }
}
