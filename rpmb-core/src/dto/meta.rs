//! Object metadata and resource kinds

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Identifies a namespaced resource type on the API server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    /// API group, empty for the core group
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
}

impl ResourceKind {
    pub const fn new(
        group: &'static str,
        version: &'static str,
        kind: &'static str,
        plural: &'static str,
    ) -> Self {
        Self {
            group,
            version,
            kind,
            plural,
        }
    }

    pub fn is_core(&self) -> bool {
        self.group.is_empty()
    }

    /// Value of the `apiVersion` field (`v1`, `tekton.dev/v1beta1`)
    pub fn api_version(&self) -> String {
        if self.is_core() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Discovery path of the group version (`/api/v1`, `/apis/tekton.dev/v1beta1`)
    pub fn group_version_path(&self) -> String {
        if self.is_core() {
            format!("/api/{}", self.version)
        } else {
            format!("/apis/{}/{}", self.group, self.version)
        }
    }

    /// Path of the namespaced collection
    pub fn collection_path(&self, namespace: &str) -> String {
        format!(
            "{}/namespaces/{}/{}",
            self.group_version_path(),
            namespace,
            self.plural
        )
    }

    /// Path of a single named object
    pub fn item_path(&self, namespace: &str, name: &str) -> String {
        format!("{}/{}", self.collection_path(namespace), name)
    }
}

/// A typed cluster object
pub trait ClusterResource: Serialize + DeserializeOwned + Send + Sync {
    const KIND: ResourceKind;

    fn metadata(&self) -> &ObjectMeta;
}

/// Standard object metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Fields not modelled here (uid, managedFields, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    pub fn with_labels<K, V>(mut self, labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.labels
            .extend(labels.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// A list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_MAPS: ResourceKind = ResourceKind::new("", "v1", "ConfigMap", "configmaps");
    const PIPELINE_RUNS: ResourceKind =
        ResourceKind::new("tekton.dev", "v1beta1", "PipelineRun", "pipelineruns");

    #[test]
    fn test_core_paths() {
        assert_eq!(CONFIG_MAPS.api_version(), "v1");
        assert_eq!(
            CONFIG_MAPS.collection_path("builds"),
            "/api/v1/namespaces/builds/configmaps"
        );
    }

    #[test]
    fn test_group_paths() {
        assert_eq!(PIPELINE_RUNS.api_version(), "tekton.dev/v1beta1");
        assert_eq!(
            PIPELINE_RUNS.item_path("builds", "rpm-build-1"),
            "/apis/tekton.dev/v1beta1/namespaces/builds/pipelineruns/rpm-build-1"
        );
    }

    #[test]
    fn test_metadata_keeps_unknown_fields() {
        let json = serde_json::json!({
            "name": "rpm-build-1",
            "namespace": "builds",
            "uid": "0b7c",
            "resourceVersion": "42",
            "generation": 3
        });

        let meta: ObjectMeta = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(meta.resource_version.as_deref(), Some("42"));
        assert_eq!(meta.extra["uid"], "0b7c");
        assert_eq!(serde_json::to_value(&meta).unwrap(), json);
    }
}
