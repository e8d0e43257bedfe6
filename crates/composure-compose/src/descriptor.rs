//! Build-or-pull descriptors for downstream image pipelines.

use composure_common::error::{ComposeError, Result};
use composure_common::types::SchemaVersion;
use serde::{Deserialize, Serialize};

use crate::model::{Composition, KeyValues};

/// How the image of one service is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    /// Name of the service the image belongs to.
    pub service_name: String,
    /// Pull reference or build instructions.
    pub image: ImageSource,
}

/// Where an image comes from.
///
/// Serializes as the bare pull reference or as the build object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// Pull the named reference.
    Pull(String),
    /// Build from a context.
    Build(BuildConfig),
}

/// Build instructions of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build context directory.
    pub context: String,
    /// Dockerfile relative to the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    /// Build arguments.
    #[serde(default, skip_serializing_if = "KeyValues::is_empty")]
    pub args: KeyValues,
    /// Labels applied to the built image.
    #[serde(default, skip_serializing_if = "KeyValues::is_empty")]
    pub labels: KeyValues,
    /// Tag assigned to the built image, taken from the service's `image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ImageDescriptor {
    /// Returns the pull reference, or `None` for build descriptors.
    pub fn pull_reference(&self) -> Option<&str> {
        match &self.image {
            ImageSource::Pull(reference) => Some(reference),
            ImageSource::Build(_) => None,
        }
    }
}

/// Projects a canonical composition into one descriptor per service, in
/// service order.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] if the composition is not at the
/// canonical version, and [`ComposeError::InternalInconsistency`] if a
/// service has neither an image nor a build.
pub fn parse(composition: &Composition) -> Result<Vec<ImageDescriptor>> {
    let canonical = SchemaVersion::from_tag(&composition.version)
        .is_ok_and(SchemaVersion::is_canonical);
    if !canonical {
        return Err(ComposeError::validation(format!(
            "Composition must be at version {} to be parsed, got '{}'",
            SchemaVersion::CANONICAL,
            composition.version
        )));
    }

    composition
        .services
        .iter()
        .map(|(name, service)| {
            let image = match (&service.image, &service.build) {
                (Some(reference), None) => ImageSource::Pull(reference.clone()),
                (tag, Some(build)) => ImageSource::Build(BuildConfig {
                    context: build.context.clone(),
                    dockerfile: build.dockerfile.clone(),
                    args: build.args.clone(),
                    labels: build.labels.clone(),
                    tag: tag.clone(),
                }),
                (None, None) => {
                    return Err(ComposeError::InternalInconsistency {
                        message: format!("service '{name}' has neither an image nor a build"),
                    });
                }
            };
            Ok(ImageDescriptor {
                service_name: name.clone(),
                image,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use composure_common::constants::CANONICAL_VERSION;
    use indexmap::IndexMap;

    use super::*;
    use crate::model::{Build, Service};

    fn composition(services: Vec<(&str, Service)>) -> Composition {
        Composition {
            version: CANONICAL_VERSION.into(),
            services: services
                .into_iter()
                .map(|(name, service)| (name.to_string(), service))
                .collect(),
            ..Composition::default()
        }
    }

    #[test]
    fn image_only_is_a_pull() {
        let c = composition(vec![(
            "db",
            Service {
                image: Some("postgres:16".into()),
                ..Service::default()
            },
        )]);
        let descriptors = parse(&c).expect("parse");
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].service_name, "db");
        assert_eq!(descriptors[0].pull_reference(), Some("postgres:16"));
    }

    #[test]
    fn image_with_build_becomes_tag() {
        let c = composition(vec![(
            "web",
            Service {
                image: Some("registry/web:1".into()),
                build: Some(Build {
                    context: "./web".into(),
                    dockerfile: Some("Dockerfile.prod".into()),
                    args: IndexMap::from([("A".to_string(), "1".to_string())]),
                    ..Build::default()
                }),
                ..Service::default()
            },
        )]);
        let descriptors = parse(&c).expect("parse");
        let ImageSource::Build(build) = &descriptors[0].image else {
            panic!("expected a build descriptor, got {:?}", descriptors[0].image);
        };
        assert_eq!(build.context, "./web");
        assert_eq!(build.dockerfile.as_deref(), Some("Dockerfile.prod"));
        assert_eq!(build.tag.as_deref(), Some("registry/web:1"));
        assert_eq!(build.args.get("A").map(String::as_str), Some("1"));
    }

    #[test]
    fn service_order_is_preserved() {
        let pull = |image: &str| Service {
            image: Some(image.into()),
            ..Service::default()
        };
        let c = composition(vec![("z", pull("z")), ("a", pull("a")), ("m", pull("m"))]);
        let names: Vec<String> = parse(&c)
            .expect("parse")
            .into_iter()
            .map(|d| d.service_name)
            .collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn non_canonical_version_fails() {
        let mut c = composition(vec![]);
        c.version = "2.0".into();
        let err = parse(&c).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("2.0"), "got: {err}");
    }

    #[test]
    fn unknown_version_fails() {
        let mut c = composition(vec![]);
        c.version = "3".into();
        let err = parse(&c).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'3'"), "got: {err}");
    }

    #[test]
    fn service_without_image_or_build_is_inconsistent() {
        let c = composition(vec![("broken", Service::default())]);
        let err = parse(&c).unwrap_err();
        assert!(matches!(err, ComposeError::InternalInconsistency { .. }));
    }

    #[test]
    fn descriptors_serialize_with_camel_case_names() {
        let c = composition(vec![
            (
                "db",
                Service {
                    image: Some("redis".into()),
                    ..Service::default()
                },
            ),
            (
                "w",
                Service {
                    build: Some(Build {
                        context: ".".into(),
                        ..Build::default()
                    }),
                    ..Service::default()
                },
            ),
        ]);
        let json = serde_json::to_value(parse(&c).expect("parse")).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!([
                {"serviceName": "db", "image": "redis"},
                {"serviceName": "w", "image": {"context": "."}}
            ])
        );
    }

    #[test]
    fn descriptors_read_back_from_json() {
        let descriptors: Vec<ImageDescriptor> = serde_json::from_value(serde_json::json!([
            {"serviceName": "db", "image": "redis"},
            {"serviceName": "w", "image": {"context": ".", "tag": "w:dev"}}
        ]))
        .expect("deserialize");
        assert_eq!(descriptors[0].pull_reference(), Some("redis"));
        assert!(matches!(
            &descriptors[1].image,
            ImageSource::Build(build) if build.tag.as_deref() == Some("w:dev")
        ));
    }
}
