//! Domain primitive types used across the Composure workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::WILDCARD_CHARS;
use crate::error::{ComposeError, Result};

/// Schema version a composition document declares.
///
/// Versions form a linear chain; [`SchemaVersion::next`] advances one step
/// towards [`SchemaVersion::CANONICAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaVersion {
    /// Legacy format: the top-level object is the service map.
    V1,
    /// First versioned format with `services`, `networks` and `volumes`.
    V2_0,
    /// Canonical format.
    V2_1,
}

impl SchemaVersion {
    /// Version every document is migrated to.
    pub const CANONICAL: Self = Self::V2_1;

    /// All supported versions, oldest first.
    pub const ALL: [Self; 3] = [Self::V1, Self::V2_0, Self::V2_1];

    /// Resolves a textual version tag.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::UnsupportedVersion`] for unknown tags.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.trim() {
            "1" | "1.0" => Ok(Self::V1),
            "2" | "2.0" => Ok(Self::V2_0),
            "2.1" => Ok(Self::V2_1),
            other => Err(ComposeError::UnsupportedVersion {
                version: other.to_string(),
            }),
        }
    }

    /// Returns the canonical tag for this version.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V2_0 => "2.0",
            Self::V2_1 => "2.1",
        }
    }

    /// Returns the version one migration step ahead, or `None` when canonical.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::V1 => Some(Self::V2_0),
            Self::V2_0 => Some(Self::V2_1),
            Self::V2_1 => None,
        }
    }

    /// Returns `true` for the canonical version.
    pub const fn is_canonical(self) -> bool {
        matches!(self, Self::V2_1)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized env file path, relative to the project directory.
///
/// Construction rejects absolute paths, wildcards and paths that climb out
/// of the project directory. `.` segments and redundant separators are
/// removed, so equal files compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EnvFilePath(String);

impl EnvFilePath {
    /// Parses and normalizes a raw `env_file` entry.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Validation`] if the path is empty, absolute,
    /// contains a wildcard, or escapes the project directory.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(ComposeError::validation("env_file path must not be empty"));
        }
        if raw.contains(WILDCARD_CHARS) {
            return Err(ComposeError::validation(format!(
                "Wildcards are not allowed in env_file paths: '{raw}'"
            )));
        }
        if is_absolute(raw) {
            return Err(ComposeError::validation(format!(
                "Absolute env_file paths are not allowed: '{raw}'"
            )));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(ComposeError::validation(format!(
                            "env_file path escapes the project directory: '{raw}'"
                        )));
                    }
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(ComposeError::validation(format!(
                "env_file path does not name a file: '{raw}'"
            )));
        }
        Ok(Self(segments.join("/")))
    }

    /// Returns the normalized path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_absolute(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    raw.starts_with('/')
        || raw.starts_with('\\')
        || raw.starts_with('~')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

impl TryFrom<String> for EnvFilePath {
    type Error = ComposeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<EnvFilePath> for String {
    fn from(value: EnvFilePath) -> Self {
        value.0
    }
}

impl fmt::Display for EnvFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
