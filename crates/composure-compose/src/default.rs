//! Default composition for projects without one.
//!
//! A project that only has an image name or a Dockerfile still gets a
//! composition: a single service with one persistent data volume.

use composure_common::config::ComposureConfig;
use composure_common::constants::{
    CANONICAL_VERSION, DEFAULT_DATA_MOUNT, DEFAULT_DATA_VOLUME, DEFAULT_SERVICE_NAME,
};
use composure_common::error::{ComposeError, Result};
use indexmap::IndexMap;
use serde_json::Value;

use crate::model::{Build, Composition, Service, Volume};

/// Generates the YAML text of a default composition.
///
/// The service uses `image` when given, and otherwise builds the project
/// directory with the optional `dockerfile`. The header comment names the
/// tool and the version injected through `config`.
///
/// # Errors
///
/// Returns [`ComposeError::InternalInconsistency`] if the document cannot be
/// rendered.
pub fn default_composition(
    image: Option<&str>,
    dockerfile: Option<&str>,
    config: &ComposureConfig,
) -> Result<String> {
    let build = if image.is_some() {
        None
    } else {
        Some(Build {
            context: ".".to_string(),
            dockerfile: dockerfile.map(str::to_string),
            ..Build::default()
        })
    };

    let service = Service {
        image: image.map(str::to_string),
        build,
        volumes: vec![format!("{DEFAULT_DATA_VOLUME}:{DEFAULT_DATA_MOUNT}")],
        extra: IndexMap::from([("restart".to_string(), Value::from("always"))]),
        ..Service::default()
    };

    let composition = Composition {
        version: CANONICAL_VERSION.to_string(),
        services: IndexMap::from([(DEFAULT_SERVICE_NAME.to_string(), service)]),
        volumes: IndexMap::from([(DEFAULT_DATA_VOLUME.to_string(), Volume::default())]),
        ..Composition::default()
    };

    let body = serde_yaml::to_string(&composition).map_err(|e| {
        ComposeError::InternalInconsistency {
            message: format!("default composition could not be rendered: {e}"),
        }
    })?;
    tracing::debug!(image = ?image, dockerfile = ?dockerfile, "generated default composition");
    Ok(format!("# Generated by {}\n{body}", config.banner()))
}
