//! Env file expansion.
//!
//! Reads the env files a canonical [`Composition`] references through an
//! injected [`FileResolver`], merges their variables into each service's
//! `environment`, and interpolates every key/value field.
//!
//! Every distinct path is fetched exactly once per expansion, no matter how
//! many services list it, and the parsed result is shared between them.
//! Fetches run concurrently up to a configurable bound. Merging happens on a
//! scratch copy that is returned only when every fetch and every
//! interpolation succeeded.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use composure_common::constants::DEFAULT_MAX_CONCURRENT_FETCHES;
use composure_common::error::{ComposeError, Result};
use composure_common::types::EnvFilePath;
use futures::stream::{self, StreamExt, TryStreamExt};
use indexmap::IndexSet;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::interpolate;
use crate::model::{Composition, KeyValues};
use crate::normalize::fields::split_key_value;

/// Byte stream returned by a [`FileResolver`].
pub type EnvFileStream = Box<dyn AsyncRead + Send + Unpin>;

/// Capability that opens env files by their normalized project-relative path.
///
/// Implementations are expected to reject symbolic links that lead outside
/// the project and paths that do not exist.
#[async_trait]
pub trait FileResolver: Send + Sync {
    /// Opens the env file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or is not allowed.
    async fn resolve(&self, path: &EnvFilePath) -> io::Result<EnvFileStream>;
}

/// Parses the content of an env file.
///
/// Blank lines and lines starting with `#` are skipped. Every other line is
/// a `KEY=VALUE` entry split at the first `=`; later lines overwrite earlier
/// lines with the same key.
///
/// # Errors
///
/// Returns [`ComposeError::EnvFile`] for a line with an empty key.
pub fn parse_env_content(path: &EnvFilePath, content: &str) -> Result<KeyValues> {
    let mut variables = KeyValues::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = split_key_value(line);
        if key.is_empty() {
            return Err(ComposeError::EnvFile {
                path: path.to_string(),
                reason: format!("line {} has no variable name", number + 1),
            });
        }
        let _ = variables.insert(key, value);
    }
    Ok(variables)
}

/// Merges env files into a composition and interpolates its key/value fields.
pub struct EnvFileExpander<'a> {
    resolver: &'a dyn FileResolver,
    variables: &'a KeyValues,
    max_concurrent_fetches: usize,
}

impl<'a> EnvFileExpander<'a> {
    /// Creates an expander reading files through `resolver` and resolving
    /// `$NAME` references against `variables`.
    pub fn new(resolver: &'a dyn FileResolver, variables: &'a KeyValues) -> Self {
        Self {
            resolver,
            variables,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    /// Sets the maximum number of env files read at the same time.
    ///
    /// A limit of zero is treated as one.
    #[must_use]
    pub const fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit;
        self
    }

    /// Expands `composition`, returning a new composition without `env_file`
    /// entries.
    ///
    /// The merge order is fixed: inline `environment` entries win over env
    /// files, and an earlier listed env file wins over a later one.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::EnvFile`] if any file cannot be fetched or
    /// decoded, and [`ComposeError::Expansion`] if a required variable is
    /// missing. No partial result is returned.
    pub async fn expand(&self, composition: &Composition) -> Result<Composition> {
        let paths: IndexSet<&EnvFilePath> = composition
            .services
            .values()
            .filter_map(|service| service.env_file.as_ref())
            .flatten()
            .collect();
        tracing::info!(
            services = composition.services.len(),
            env_files = paths.len(),
            "expanding env files"
        );

        let cache: HashMap<EnvFilePath, Arc<KeyValues>> = stream::iter(paths)
            .map(|path| async move {
                let variables = self.fetch(path).await?;
                Ok::<_, ComposeError>((path.clone(), Arc::new(variables)))
            })
            .buffer_unordered(self.max_concurrent_fetches.max(1))
            .try_collect()
            .await?;

        let mut scratch = composition.clone();
        for (name, service) in &mut scratch.services {
            if let Some(files) = service.env_file.take() {
                for path in &files {
                    let variables = cache.get(path).ok_or_else(|| {
                        ComposeError::InternalInconsistency {
                            message: format!("env file '{path}' of service '{name}' was not fetched"),
                        }
                    })?;
                    merge_missing(&mut service.environment, variables);
                }
                tracing::debug!(service = %name, files = files.len(), "merged env files");
            }

            self.interpolate(&mut service.environment)?;
            self.interpolate(&mut service.labels)?;
            if let Some(build) = service.build.as_mut() {
                self.interpolate(&mut build.args)?;
                self.interpolate(&mut build.labels)?;
            }
        }
        for network in scratch.networks.values_mut() {
            self.interpolate(&mut network.labels)?;
        }
        for volume in scratch.volumes.values_mut() {
            self.interpolate(&mut volume.labels)?;
        }

        Ok(scratch)
    }

    async fn fetch(&self, path: &EnvFilePath) -> Result<KeyValues> {
        tracing::debug!(path = %path, "fetching env file");
        let failed = |e: io::Error| ComposeError::EnvFile {
            path: path.to_string(),
            reason: e.to_string(),
        };

        let mut stream = self.resolver.resolve(path).await.map_err(failed)?;
        let mut bytes = Vec::new();
        let _ = stream.read_to_end(&mut bytes).await.map_err(failed)?;
        let content = String::from_utf8(bytes).map_err(|_| ComposeError::EnvFile {
            path: path.to_string(),
            reason: "content is not valid UTF-8".to_string(),
        })?;
        parse_env_content(path, &content)
    }

    fn interpolate(&self, values: &mut KeyValues) -> Result<()> {
        for value in values.values_mut() {
            if value.contains('$') {
                *value = interpolate::expand(value, |name| self.variables.get(name).cloned())?;
            }
        }
        Ok(())
    }
}

/// Inserts every variable `environment` does not define yet.
fn merge_missing(environment: &mut KeyValues, variables: &KeyValues) {
    for (key, value) in variables {
        let _ = environment
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}
