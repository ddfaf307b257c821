//! Pod document
//!
//! Only what log retrieval needs: the pod name and its container names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::meta::{ClusterResource, ObjectMeta, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<PodSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pod {
    pub const KIND: ResourceKind = ResourceKind::new("", "v1", "Pod", "pods");

    pub fn container_names(&self) -> Vec<&str> {
        self.spec
            .iter()
            .flat_map(|spec| spec.containers.iter())
            .map(|c| c.name.as_str())
            .collect()
    }
}

impl ClusterResource for Pod {
    const KIND: ResourceKind = Pod::KIND;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}
