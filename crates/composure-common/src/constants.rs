//! System-wide constants.

/// Version tag every composition is migrated to.
pub const CANONICAL_VERSION: &str = "2.1";

/// Pattern every label key must match.
pub const LABEL_KEY_PATTERN: &str = r"^[A-Za-z0-9.-]+$";

/// Application name used in generated documents and CLI output.
pub const APP_NAME: &str = "composure";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "composure";

/// Default upper bound on concurrently fetched env files.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Name of the service in a generated default composition.
pub const DEFAULT_SERVICE_NAME: &str = "main";

/// Name of the persistent volume in a generated default composition.
pub const DEFAULT_DATA_VOLUME: &str = "app-data";

/// Mount point of the persistent volume in a generated default composition.
pub const DEFAULT_DATA_MOUNT: &str = "/data";

/// Characters that make an env file path a wildcard pattern.
pub const WILDCARD_CHARS: &[char] = &['*', '?', '[', ']', '{', '}'];
