//! Per-entity normalization of services, networks and volumes.

use composure_common::error::{ComposeError, Result};
use composure_common::types::EnvFilePath;
use indexmap::IndexSet;
use serde_json::{Map, Value};

use super::fields;
use super::validator::{self, Declarations};
use crate::model::{Build, Network, Service, ServiceNetworks, Volume};

/// Normalizes one raw service definition.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] on the first field that cannot be
/// normalized or fails a semantic check.
pub fn normalize_service(
    name: &str,
    raw: &Value,
    declarations: &Declarations<'_>,
) -> Result<Service> {
    tracing::debug!(service = name, "normalizing service");
    let mut map = entity_map("Service", name, raw)?;
    let owner = format!("service '{name}'");

    let image = fields::optional_string("image", map.shift_remove("image").as_ref())?;
    let build = map
        .shift_remove("build")
        .filter(|value| !value.is_null())
        .map(|value| normalize_build(name, &value))
        .transpose()?;

    let environment = take(&mut map, "environment")
        .map(|value| fields::key_values("environment", &value))
        .transpose()?
        .unwrap_or_default();

    let env_file = take(&mut map, "env_file")
        .map(|value| normalize_env_files(&value))
        .transpose()?;

    let depends_on = match take(&mut map, "depends_on") {
        None => Vec::new(),
        Some(value @ Value::Array(_)) => fields::string_list("depends_on", &value)?,
        Some(_) => {
            return Err(ComposeError::validation(format!(
                "depends_on of service '{name}' must be a list"
            )));
        }
    };
    validator::check_depends_on(name, &depends_on, declarations)?;

    let labels = take(&mut map, "labels")
        .map(|value| fields::key_values("labels", &value))
        .transpose()?
        .unwrap_or_default();
    validator::check_label_keys(&owner, &labels)?;

    let ports = take(&mut map, "ports")
        .map(|value| fields::ports(&value))
        .transpose()?
        .unwrap_or_default();

    let volumes = take(&mut map, "volumes")
        .map(|value| fields::string_list("volumes", &value))
        .transpose()?
        .unwrap_or_default();
    for entry in &volumes {
        validator::check_service_volume(entry, declarations)?;
    }

    let extra_hosts = take(&mut map, "extra_hosts")
        .map(|value| fields::extra_hosts(&value))
        .transpose()?
        .unwrap_or_default();

    let networks = take(&mut map, "networks")
        .map(|value| normalize_service_networks(name, value))
        .transpose()?;

    if image.is_none() && build.is_none() {
        return Err(ComposeError::validation(
            "You must specify either an image or a build",
        ));
    }

    Ok(Service {
        image,
        build,
        environment,
        env_file,
        depends_on,
        labels,
        ports,
        volumes,
        extra_hosts,
        networks,
        extra: map.into_iter().collect(),
    })
}

fn normalize_build(service: &str, raw: &Value) -> Result<Build> {
    let owner = format!("build of service '{service}'");
    let build = match raw {
        Value::String(context) => Build {
            context: context.clone(),
            ..Build::default()
        },
        Value::Object(map) => {
            let mut map = map.clone();
            let context = fields::optional_string("build.context", map.shift_remove("context").as_ref())?
                .unwrap_or_else(|| ".".to_string());
            let dockerfile =
                fields::optional_string("build.dockerfile", map.shift_remove("dockerfile").as_ref())?;
            let args = take(&mut map, "args")
                .map(|value| fields::key_values("build.args", &value))
                .transpose()?
                .unwrap_or_default();
            let labels = take(&mut map, "labels")
                .map(|value| fields::key_values("build.labels", &value))
                .transpose()?
                .unwrap_or_default();
            Build {
                context,
                dockerfile,
                args,
                labels,
                extra: map.into_iter().collect(),
            }
        }
        other => {
            return Err(ComposeError::validation(format!(
                "Invalid {owner}: expected a string or a mapping, got {other}"
            )));
        }
    };
    validator::check_label_keys(&owner, &build.labels)?;
    Ok(build)
}

fn normalize_env_files(raw: &Value) -> Result<Vec<EnvFilePath>> {
    let mut paths = IndexSet::new();
    for entry in fields::string_or_list("env_file", raw)? {
        let _ = paths.insert(EnvFilePath::parse(&entry)?);
    }
    Ok(paths.into_iter().collect())
}

fn normalize_service_networks(service: &str, raw: Value) -> Result<ServiceNetworks> {
    match raw {
        Value::Array(_) => Ok(ServiceNetworks::List(fields::string_list("networks", &raw)?)),
        Value::Object(map) => Ok(ServiceNetworks::Map(map.into_iter().collect())),
        other => Err(ComposeError::validation(format!(
            "Invalid networks of service '{service}': expected a list or a mapping, got {other}"
        ))),
    }
}

/// Normalizes one raw network definition.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] for malformed fields or label keys.
pub fn normalize_network(name: &str, raw: &Value) -> Result<Network> {
    let mut map = entity_map("Network", name, raw)?;
    let driver = fields::optional_string("driver", map.shift_remove("driver").as_ref())?;
    let labels = take(&mut map, "labels")
        .map(|value| fields::key_values("labels", &value))
        .transpose()?
        .unwrap_or_default();
    validator::check_label_keys(&format!("network '{name}'"), &labels)?;
    Ok(Network {
        driver,
        labels,
        external: map.shift_remove("external"),
        extra: map.into_iter().collect(),
    })
}

/// Normalizes one raw volume definition.
///
/// # Errors
///
/// Returns [`ComposeError::Validation`] for malformed fields or label keys.
pub fn normalize_volume(name: &str, raw: &Value) -> Result<Volume> {
    let mut map = entity_map("Volume", name, raw)?;
    let driver = fields::optional_string("driver", map.shift_remove("driver").as_ref())?;
    let labels = take(&mut map, "labels")
        .map(|value| fields::key_values("labels", &value))
        .transpose()?
        .unwrap_or_default();
    validator::check_label_keys(&format!("volume '{name}'"), &labels)?;
    Ok(Volume {
        driver,
        labels,
        external: map.shift_remove("external"),
        extra: map.into_iter().collect(),
    })
}

fn entity_map(kind: &str, name: &str, raw: &Value) -> Result<Map<String, Value>> {
    match raw {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        other => Err(ComposeError::validation(format!(
            "{kind} '{name}' must be a mapping, got {other}"
        ))),
    }
}

/// Removes a key, treating an explicit `null` as absent.
fn take(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.shift_remove(key).filter(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn declarations<'a>(services: &[&'a str], volumes: &[&'a str]) -> Declarations<'a> {
        Declarations {
            services: services.iter().copied().collect(),
            volumes: volumes.iter().copied().collect(),
        }
    }

    #[test]
    fn build_shorthand_becomes_context() {
        let service = normalize_service("web", &json!({"build": "./app"}), &declarations(&["web"], &[]))
            .expect("normalize");
        let build = service.build.expect("build");
        assert_eq!(build.context, "./app");
        assert!(build.dockerfile.is_none());
    }

    #[test]
    fn build_mapping_is_normalized() {
        let raw = json!({
            "image": "registry/web:1",
            "build": {
                "context": ".",
                "dockerfile": "Dockerfile.web",
                "args": ["VERSION=1.2"],
                "labels": {"io.example.tier": "web"},
                "target": "prod"
            }
        });
        let service = normalize_service("web", &raw, &declarations(&["web"], &[])).expect("normalize");
        let build = service.build.expect("build");
        assert_eq!(build.dockerfile.as_deref(), Some("Dockerfile.web"));
        assert_eq!(build.args.get("VERSION").map(String::as_str), Some("1.2"));
        assert_eq!(build.extra.get("target"), Some(&json!("prod")));
        assert_eq!(service.image.as_deref(), Some("registry/web:1"));
    }

    #[test]
    fn build_label_keys_are_checked() {
        let raw = json!({"build": {"context": ".", "labels": {"bad key": "x"}}});
        let err = normalize_service("web", &raw, &declarations(&["web"], &[])).unwrap_err();
        assert!(err.to_string().contains("bad key"), "got: {err}");
    }

    #[test]
    fn missing_image_and_build_fails() {
        let err = normalize_service("web", &json!({"restart": "always"}), &declarations(&["web"], &[]))
            .unwrap_err();
        assert_eq!(err.to_string(), "You must specify either an image or a build");
    }

    #[test]
    fn null_service_fails_on_missing_image() {
        let err = normalize_service("web", &Value::Null, &declarations(&["web"], &[])).unwrap_err();
        assert!(err.to_string().contains("image or a build"), "got: {err}");
    }

    #[test]
    fn depends_on_must_be_a_list() {
        let raw = json!({"image": "a", "depends_on": {"db": {"condition": "service_started"}}});
        let err = normalize_service("web", &raw, &declarations(&["web", "db"], &[])).unwrap_err();
        assert!(err.to_string().contains("must be a list"), "got: {err}");
    }

    #[test]
    fn env_file_is_normalized_and_deduplicated() {
        let raw = json!({"image": "a", "env_file": ["./a.env", "a.env", "conf/../b.env"]});
        let service = normalize_service("web", &raw, &declarations(&["web"], &[])).expect("normalize");
        let paths: Vec<&str> = service
            .env_file
            .as_ref()
            .expect("env_file")
            .iter()
            .map(EnvFilePath::as_str)
            .collect();
        assert_eq!(paths, vec!["a.env", "b.env"]);
    }

    #[test]
    fn single_env_file_becomes_list() {
        let raw = json!({"image": "a", "env_file": ".env"});
        let service = normalize_service("web", &raw, &declarations(&["web"], &[])).expect("normalize");
        assert_eq!(service.env_file.map(|files| files.len()), Some(1));
    }

    #[test]
    fn unknown_keys_are_carried_through() {
        let raw = json!({"image": "a", "privileged": true, "command": ["run"]});
        let service = normalize_service("web", &raw, &declarations(&["web"], &[])).expect("normalize");
        assert_eq!(service.extra.get("privileged"), Some(&json!(true)));
        assert_eq!(service.extra.get("command"), Some(&json!(["run"])));
    }

    #[test]
    fn network_labels_are_normalized() {
        let network = normalize_network("front", &json!({"labels": ["tier=front"]})).expect("normalize");
        assert_eq!(network.labels.get("tier").map(String::as_str), Some("front"));
    }

    #[test]
    fn null_volume_is_default() {
        let volume = normalize_volume("data", &Value::Null).expect("normalize");
        assert_eq!(volume, Volume::default());
    }

    #[test]
    fn volume_label_keys_are_checked() {
        let err = normalize_volume("data", &json!({"labels": {"mal_formed": "1"}})).unwrap_err();
        assert!(err.to_string().contains("mal_formed"), "got: {err}");
    }
}
