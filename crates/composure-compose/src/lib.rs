//! # composure-compose
//!
//! Normalization of container composition documents.
//!
//! Handles:
//! - **Version**: Detection of the declared schema version and preflight coercion.
//! - **Schema**: Structural validation against embedded per-version schemas.
//! - **Migrate**: Stepwise migration to the canonical version.
//! - **Normalize**: Canonical field encodings and cross-entity checks.
//! - **Graph**: `depends_on` cycle detection and startup order.
//! - **Interpolate**: Shell-like `$NAME` / `${NAME:-default}` expansion.
//! - **Env files**: Memoized, concurrent env file merging.
//! - **Descriptor**: Build-or-pull descriptors for image pipelines.
//! - **Default**: Generated compositions for projects without one.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod default;
pub mod descriptor;
pub mod env_file;
pub mod fs_resolver;
pub mod graph;
pub mod interpolate;
pub mod migrate;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod version;

pub use default::default_composition;
pub use descriptor::{BuildConfig, ImageDescriptor, ImageSource, parse};
pub use env_file::{EnvFileExpander, FileResolver};
pub use fs_resolver::ProjectFileResolver;
pub use graph::DependencyGraph;
pub use model::{Build, Composition, KeyValues, Network, Service, ServiceNetworks, Volume};
pub use pipeline::{Normalizer, expand_env_files, normalize, normalize_with_env_files};
pub use schema::{JsonSchemaValidator, NoopValidator, SchemaValidator};
