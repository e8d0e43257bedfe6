//! Semantic checks that span entities.
//!
//! Checks label key syntax, service volume references and `depends_on`
//! targets against the declarations of the composition being normalized.

use std::collections::HashSet;
use std::sync::LazyLock;

use composure_common::constants::LABEL_KEY_PATTERN;
use composure_common::error::{ComposeError, Result};
use regex::Regex;

use crate::model::KeyValues;

static LABEL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(LABEL_KEY_PATTERN).unwrap_or_else(|_| unreachable!("label key pattern is valid"))
});

/// Names declared at the top level of a composition.
#[derive(Debug, Default)]
pub struct Declarations<'a> {
    /// Declared service names.
    pub services: HashSet<&'a str>,
    /// Declared volume names.
    pub volumes: HashSet<&'a str>,
}

/// Fails on the first label key that does not match `^[A-Za-z0-9.-]+$`.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] naming the offending key.
pub fn check_label_keys(owner: &str, labels: &KeyValues) -> Result<()> {
    match labels.keys().find(|key| !LABEL_KEY.is_match(key)) {
        Some(key) => Err(ComposeError::validation(format!(
            "Invalid label name '{key}' in {owner}: label names may only contain letters, digits, '.' and '-'"
        ))),
        None => Ok(()),
    }
}

/// Checks one short-syntax service volume entry.
///
/// The source must be a declared named volume; anything that looks like a
/// host path is a bind mount and is refused.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] for malformed entries, bind mounts,
/// and undeclared volumes.
pub fn check_service_volume(entry: &str, declarations: &Declarations<'_>) -> Result<()> {
    let Some((source, target)) = entry.split_once(':') else {
        return Err(ComposeError::validation(format!(
            "Invalid volume specification '{entry}': expected 'volume:target'"
        )));
    };
    if source.is_empty() || target.is_empty() {
        return Err(ComposeError::validation(format!(
            "Invalid volume specification '{entry}': expected 'volume:target'"
        )));
    }
    if is_host_path(source) {
        return Err(ComposeError::validation("Bind mounts are not allowed"));
    }
    if !declarations.volumes.contains(source) {
        return Err(ComposeError::validation(format!(
            "Missing volume definition for '{source}'"
        )));
    }
    Ok(())
}

/// A host path has a directory component; dotted or `~` names are volume names.
fn is_host_path(source: &str) -> bool {
    source.contains(['/', '\\'])
}

/// Checks that `depends_on` has no duplicates and names declared services.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] for duplicate or unknown entries.
pub fn check_depends_on(
    service: &str,
    depends_on: &[String],
    declarations: &Declarations<'_>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for dependency in depends_on {
        if !seen.insert(dependency.as_str()) {
            return Err(ComposeError::validation(format!(
                "Service '{service}' lists dependency '{dependency}' more than once"
            )));
        }
        if !declarations.services.contains(dependency.as_str()) {
            return Err(ComposeError::validation(format!(
                "Service '{service}' depends on undefined service '{dependency}'"
            )));
        }
    }
    Ok(())
}
