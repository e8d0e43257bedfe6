//! Field normalization of canonical-version documents.
//!
//! Takes a document that has already been migrated to the canonical
//! version and produces a typed [`Composition`] whose fields all use one
//! representation. Normalization is fail-fast: the first invalid field
//! aborts the whole document.

pub mod fields;
pub mod service;
pub mod validator;

use composure_common::constants::CANONICAL_VERSION;
use composure_common::error::{ComposeError, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use self::validator::Declarations;
use crate::graph::DependencyGraph;
use crate::model::Composition;

const TOP_LEVEL_KEYS: [&str; 4] = ["version", "services", "networks", "volumes"];

/// Normalizes a canonical-version document into a [`Composition`].
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] for the first violation found, and
/// [`ComposeError::InternalInconsistency`] if the document was not migrated.
pub fn normalize_document(document: &Value) -> Result<Composition> {
    let Value::Object(root) = document else {
        return Err(ComposeError::validation(
            "Composition must be a mapping at the top level",
        ));
    };

    if root.get("version").and_then(Value::as_str) != Some(CANONICAL_VERSION) {
        return Err(ComposeError::InternalInconsistency {
            message: format!("normalization expects version {CANONICAL_VERSION}"),
        });
    }
    if let Some(key) = root.keys().find(|key| !TOP_LEVEL_KEYS.contains(&key.as_str())) {
        return Err(ComposeError::validation(format!(
            "Unsupported top-level key '{key}'"
        )));
    }

    let services = section(root, "services")?;
    let networks = section(root, "networks")?;
    let volumes = section(root, "volumes")?;

    let declarations = Declarations {
        services: services.keys().map(String::as_str).collect(),
        volumes: volumes.keys().map(String::as_str).collect(),
    };

    let composition = Composition {
        version: CANONICAL_VERSION.to_string(),
        networks: normalize_each(networks, service::normalize_network)?,
        volumes: normalize_each(volumes, service::normalize_volume)?,
        services: normalize_each(services, |name, raw| {
            service::normalize_service(name, raw, &declarations)
        })?,
    };

    let _ = DependencyGraph::from_composition(&composition).startup_order()?;
    Ok(composition)
}

fn section<'a>(root: &'a Map<String, Value>, key: &str) -> Result<&'a Map<String, Value>> {
    static EMPTY: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);

    match root.get(key) {
        None | Some(Value::Null) => Ok(&EMPTY),
        Some(Value::Object(entries)) => Ok(entries),
        Some(other) => Err(ComposeError::validation(format!(
            "{key} must be a mapping, got {other}"
        ))),
    }
}

fn normalize_each<T, F>(entries: &Map<String, Value>, normalize: F) -> Result<IndexMap<String, T>>
where
    F: Fn(&str, &Value) -> Result<T>,
{
    entries
        .iter()
        .map(|(name, raw)| Ok((name.clone(), normalize(name, raw)?)))
        .collect()
}
