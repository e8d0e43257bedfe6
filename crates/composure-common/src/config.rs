//! Configuration model shared by the library entry points and the CLI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a Composure invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposureConfig {
    /// Tool name written into generated documents.
    pub tool_name: String,
    /// Tool version written into generated documents.
    ///
    /// Injected by the caller; the library never reads its own package version.
    pub tool_version: Option<String>,
    /// Directory env file paths are resolved against.
    pub project_dir: PathBuf,
    /// Upper bound on env files fetched at the same time.
    pub max_concurrent_fetches: usize,
    /// Whether documents are checked against the version schema before migration.
    pub validate_schema: bool,
}

impl ComposureConfig {
    /// Returns the generator banner used at the top of generated documents.
    pub fn banner(&self) -> String {
        match &self.tool_version {
            Some(version) => format!("{} v{version}", self.tool_name),
            None => self.tool_name.clone(),
        }
    }
}

impl Default for ComposureConfig {
    fn default() -> Self {
        Self {
            tool_name: crate::constants::APP_NAME.to_string(),
            tool_version: None,
            project_dir: PathBuf::from("."),
            max_concurrent_fetches: crate::constants::DEFAULT_MAX_CONCURRENT_FETCHES,
            validate_schema: true,
        }
    }
}
