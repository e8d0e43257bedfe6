//! Canonical composition model.
//!
//! These types only ever hold normalized data: key/value fields are
//! mappings, ports are strings, `build` is always the long form. Keys the
//! model does not name are carried in each entity's `extra` map so that a
//! round trip never loses information.

use composure_common::types::EnvFilePath;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical key/value mapping (`environment`, `labels`, `build.args`, ...).
pub type KeyValues = IndexMap<String, String>;

/// Root of a canonical composition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Schema version tag. Always the canonical tag after normalization.
    pub version: String,
    /// Services in declaration order.
    #[serde(default)]
    pub services: IndexMap<String, Service>,
    /// Named networks.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub networks: IndexMap<String, Network>,
    /// Named volumes.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub volumes: IndexMap<String, Volume>,
}

/// One deployable unit of a composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Image to pull, or the tag to assign when `build` is also set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Build instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<Build>,
    /// Environment variables.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub environment: KeyValues,
    /// Env files still to be merged into `environment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<Vec<EnvFilePath>>,
    /// Services this one depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Container labels.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: KeyValues,
    /// Port mappings in short syntax.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Volume mounts in short syntax (`volume:target[:mode]`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    /// Additional `/etc/hosts` entries as `host:ip`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_hosts: Vec<String>,
    /// Networks the service joins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networks: Option<ServiceNetworks>,
    /// Every other service key, unchanged.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Network attachments of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceNetworks {
    /// Plain list of network names.
    List(Vec<String>),
    /// Network names with per-attachment options (aliases, addresses).
    Map(IndexMap<String, Value>),
}

/// Long-form build instructions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Build {
    /// Build context directory.
    pub context: String,
    /// Dockerfile path relative to the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    /// Build arguments.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub args: KeyValues,
    /// Labels applied to the built image.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: KeyValues,
    /// Every other build key, unchanged.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A named network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Network driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    /// Network labels.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: KeyValues,
    /// External network reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<Value>,
    /// Every other network key, unchanged.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A named volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// Volume driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    /// Volume labels.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: KeyValues,
    /// External volume reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<Value>,
    /// Every other volume key, unchanged.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Composition {
    /// Returns the composition as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if a carried-through value cannot be serialized.
    pub fn to_value(&self) -> composure_common::error::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collections_are_not_serialized() {
        let composition = Composition {
            version: "2.1".into(),
            services: IndexMap::from([(
                "web".to_string(),
                Service {
                    image: Some("nginx".into()),
                    ..Service::default()
                },
            )]),
            ..Composition::default()
        };
        let value = composition.to_value().expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"version": "2.1", "services": {"web": {"image": "nginx"}}})
        );
    }

    #[test]
    fn unknown_service_keys_round_trip() {
        let value = serde_json::json!({
            "version": "2.1",
            "services": {"web": {"image": "nginx", "restart": "always", "privileged": true}}
        });
        let composition: Composition = serde_json::from_value(value.clone()).expect("deserialize");
        let web = &composition.services["web"];
        assert_eq!(web.extra.get("restart"), Some(&Value::from("always")));
        assert_eq!(composition.to_value().expect("serialize"), value);
    }

    #[test]
    fn service_networks_accept_both_forms() {
        let list: ServiceNetworks =
            serde_json::from_value(serde_json::json!(["front"])).expect("list");
        assert_eq!(list, ServiceNetworks::List(vec!["front".into()]));
        let map: ServiceNetworks =
            serde_json::from_value(serde_json::json!({"front": {"aliases": ["web"]}}))
                .expect("map");
        assert!(matches!(map, ServiceNetworks::Map(ref m) if m.contains_key("front")));
    }
}
