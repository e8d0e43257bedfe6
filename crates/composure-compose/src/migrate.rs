//! Schema version migration.
//!
//! Versions form a linear chain. Each step reshapes the document into the
//! next version's layout; [`migrate`] applies steps until the document is
//! canonical.

use composure_common::error::{ComposeError, Result};
use composure_common::types::SchemaVersion;
use serde_json::{Map, Value};

/// Advances a document from `version` to the canonical version.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] if a step meets a document that is
/// not a mapping.
pub fn migrate(version: SchemaVersion, document: Value) -> Result<Value> {
    let mut version = version;
    let mut document = document;

    while let Some(next) = version.next() {
        tracing::debug!(from = %version, to = %next, "migrating composition");
        document = step(version, next, document)?;
        version = next;
    }
    Ok(document)
}

fn step(from: SchemaVersion, to: SchemaVersion, document: Value) -> Result<Value> {
    match from {
        SchemaVersion::V1 => {
            let mut wrapped = Map::new();
            let _ = wrapped.insert("version".into(), Value::from(to.as_str()));
            let _ = wrapped.insert("services".into(), document);
            Ok(Value::Object(wrapped))
        }
        SchemaVersion::V2_0 | SchemaVersion::V2_1 => retag(to, document),
    }
}

fn retag(to: SchemaVersion, document: Value) -> Result<Value> {
    let Value::Object(mut map) = document else {
        return Err(ComposeError::validation(
            "Composition must be a mapping at the top level",
        ));
    };
    let _ = map.insert("version".into(), Value::from(to.as_str()));
    Ok(Value::Object(map))
}
