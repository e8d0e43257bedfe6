//! Normalization entry points.
//!
//! Raw input flows through version resolution, preflight coercion, schema
//! validation, migration and field normalization, in that order. The
//! env-file-aware variants continue with [`EnvFileExpander`].

use std::sync::LazyLock;

use composure_common::config::ComposureConfig;
use composure_common::error::{ComposeError, Result, SchemaError};
use serde_json::Value;

use crate::env_file::{EnvFileExpander, FileResolver};
use crate::migrate::migrate;
use crate::model::{Composition, KeyValues};
use crate::normalize::normalize_document;
use crate::schema::{JsonSchemaValidator, NoopValidator, SchemaValidator};
use crate::version::{preflight, resolve_version};

static DEFAULT_VALIDATOR: LazyLock<std::result::Result<JsonSchemaValidator, SchemaError>> =
    LazyLock::new(JsonSchemaValidator::new);

/// Returns the shared validator backed by the embedded schemas.
///
/// # Errors
///
/// Returns [`ComposeError::InternalInconsistency`] if the embedded schemas
/// failed to compile.
pub fn default_validator() -> Result<&'static JsonSchemaValidator> {
    DEFAULT_VALIDATOR
        .as_ref()
        .map_err(|e| ComposeError::InternalInconsistency {
            message: format!("embedded schemas are unusable: {e}"),
        })
}

/// Normalization pipeline bound to a schema validator.
pub struct Normalizer<'a> {
    validator: &'a dyn SchemaValidator,
    max_concurrent_fetches: usize,
}

impl<'a> Normalizer<'a> {
    /// Creates a pipeline that validates documents with `validator`.
    pub fn new(validator: &'a dyn SchemaValidator) -> Self {
        Self {
            validator,
            max_concurrent_fetches: ComposureConfig::default().max_concurrent_fetches,
        }
    }

    /// Creates a pipeline configured by `config`.
    ///
    /// With `validate_schema` off, only the semantic checks of normalization
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::InternalInconsistency`] if schema validation is
    /// requested and the embedded schemas failed to compile.
    pub fn from_config(config: &ComposureConfig) -> Result<Normalizer<'static>> {
        static NOOP: NoopValidator = NoopValidator;
        let validator: &'static dyn SchemaValidator = if config.validate_schema {
            default_validator()?
        } else {
            &NOOP
        };
        Ok(Normalizer {
            validator,
            max_concurrent_fetches: config.max_concurrent_fetches,
        })
    }

    /// Sets the maximum number of env files read at the same time.
    #[must_use]
    pub const fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit;
        self
    }

    /// Normalizes a raw document into a canonical [`Composition`].
    ///
    /// # Errors
    ///
    /// Returns the first validation, schema or version error found.
    pub fn normalize(&self, document: &Value) -> Result<Composition> {
        let version = resolve_version(document)?;
        tracing::info!(version = %version, "normalizing composition");

        let document = preflight(version, document.clone())?;
        self.validator.validate(version, &document)?;
        let document = migrate(version, document)?;
        let composition = normalize_document(&document)?;

        tracing::debug!(services = composition.services.len(), "composition normalized");
        Ok(composition)
    }

    /// Normalizes a raw document, then merges its env files and interpolates
    /// its key/value fields against `variables`.
    ///
    /// # Errors
    ///
    /// Returns the first normalization error, or any error of
    /// [`Normalizer::expand_env_files`].
    pub async fn normalize_with_env_files(
        &self,
        document: &Value,
        resolver: &dyn FileResolver,
        variables: &KeyValues,
    ) -> Result<Composition> {
        let composition = self.normalize(document)?;
        self.expand_env_files(&composition, resolver, variables).await
    }

    /// Merges env files into an already canonical composition.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::EnvFile`] if a file cannot be read and
    /// [`ComposeError::Expansion`] if a required variable is missing.
    pub async fn expand_env_files(
        &self,
        composition: &Composition,
        resolver: &dyn FileResolver,
        variables: &KeyValues,
    ) -> Result<Composition> {
        EnvFileExpander::new(resolver, variables)
            .with_max_concurrent_fetches(self.max_concurrent_fetches)
            .expand(composition)
            .await
    }
}

/// Normalizes `document` with the default schema validator.
///
/// # Errors
///
/// See [`Normalizer::normalize`].
pub fn normalize(document: &Value) -> Result<Composition> {
    Normalizer::new(default_validator()?).normalize(document)
}

/// Normalizes `document` and expands its env files with the default schema
/// validator.
///
/// # Errors
///
/// See [`Normalizer::normalize_with_env_files`].
pub async fn normalize_with_env_files(
    document: &Value,
    resolver: &dyn FileResolver,
    variables: &KeyValues,
) -> Result<Composition> {
    Normalizer::new(default_validator()?)
        .normalize_with_env_files(document, resolver, variables)
        .await
}

/// Expands the env files of an already canonical composition.
///
/// # Errors
///
/// See [`Normalizer::expand_env_files`].
pub async fn expand_env_files(
    composition: &Composition,
    resolver: &dyn FileResolver,
    variables: &KeyValues,
) -> Result<Composition> {
    EnvFileExpander::new(resolver, variables)
        .expand(composition)
        .await
}
