//! Structural validation of raw documents against per-version schemas.
//!
//! The normalization pipeline depends only on the [`SchemaValidator`]
//! capability. [`JsonSchemaValidator`] is the default implementation,
//! backed by the `jsonschema` crate and the schema documents embedded from
//! the crate's `schemas/` directory.

pub mod formats;

use std::collections::HashMap;
use std::fmt;

use composure_common::error::SchemaError;
use composure_common::types::SchemaVersion;
use jsonschema::{Draft, ValidationOptions, Validator};
use serde_json::Value;

const SCHEMA_V1: &str = include_str!("../../schemas/config_v1.json");
const SCHEMA_V2_0: &str = include_str!("../../schemas/config_v2.0.json");
const SCHEMA_V2_1: &str = include_str!("../../schemas/config_v2.1.json");

/// Checks a raw document against the schema of the version it declares.
pub trait SchemaValidator: Send + Sync {
    /// Validates `document` as a document of `version`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] describing the first violation.
    fn validate(&self, version: SchemaVersion, document: &Value) -> Result<(), SchemaError>;
}

/// Validator that accepts every document.
///
/// Used when schema checks are disabled; semantic normalization checks still
/// apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl SchemaValidator for NoopValidator {
    fn validate(&self, _version: SchemaVersion, _document: &Value) -> Result<(), SchemaError> {
        Ok(())
    }
}

/// Schema validator backed by the `jsonschema` crate.
///
/// One validator is compiled per supported version at construction time;
/// validation itself is read-only and can be shared across threads.
pub struct JsonSchemaValidator {
    validators: HashMap<SchemaVersion, Validator>,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut versions: Vec<&SchemaVersion> = self.validators.keys().collect();
        versions.sort();
        f.debug_struct("JsonSchemaValidator")
            .field("versions", &versions)
            .finish()
    }
}

impl JsonSchemaValidator {
    /// Compiles the embedded schemas of every supported version.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if an embedded schema is not valid JSON or
    /// cannot be compiled.
    pub fn new() -> Result<Self, SchemaError> {
        let options = build_options();
        let mut validators = HashMap::new();
        for version in SchemaVersion::ALL {
            let schema: Value = serde_json::from_str(schema_source(version)).map_err(|e| {
                SchemaError::new("/", format!("embedded schema for {version} is not JSON: {e}"))
            })?;
            let validator = options.build(&schema).map_err(|e| {
                SchemaError::new("/", format!("embedded schema for {version} does not compile: {e}"))
            })?;
            let _ = validators.insert(version, validator);
        }
        Ok(Self { validators })
    }

    /// Returns the raw schema document for `version`.
    pub fn schema(version: SchemaVersion) -> &'static str {
        schema_source(version)
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, version: SchemaVersion, document: &Value) -> Result<(), SchemaError> {
        let validator = self.validators.get(&version).ok_or_else(|| {
            SchemaError::new("/", format!("no schema registered for version {version}"))
        })?;
        tracing::debug!(version = %version, "validating against schema");
        validator
            .validate(document)
            .map_err(|e| SchemaError::new(e.instance_path.to_string(), e.to_string()))
    }
}

const fn schema_source(version: SchemaVersion) -> &'static str {
    match version {
        SchemaVersion::V1 => SCHEMA_V1,
        SchemaVersion::V2_0 => SCHEMA_V2_0,
        SchemaVersion::V2_1 => SCHEMA_V2_1,
    }
}

fn build_options() -> ValidationOptions {
    let mut opts = jsonschema::options();
    let _ = opts
        .with_draft(Draft::Draft4)
        .should_validate_formats(true)
        .with_format("ports", formats::is_port_mapping)
        .with_format("expose", formats::is_exposed_port)
        .with_format("duration", formats::is_duration)
        .with_format("subnet_ip_address", formats::is_subnet);
    opts
}
