//! ConfigMap document

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::meta::{ClusterResource, ObjectMeta, ResourceKind};

/// Kubernetes ConfigMap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Base64 encoded values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary_data: BTreeMap<String, String>,
}

impl ConfigMap {
    pub const KIND: ResourceKind = ResourceKind::new("", "v1", "ConfigMap", "configmaps");

    /// Largest object the API server stores (etcd request limit)
    pub const MAX_SIZE_BYTES: usize = 1024 * 1024;

    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            api_version: Self::KIND.api_version(),
            kind: Self::KIND.kind.to_string(),
            metadata,
            data: BTreeMap::new(),
            binary_data: BTreeMap::new(),
        }
    }

    /// Bytes counted against [`ConfigMap::MAX_SIZE_BYTES`]
    ///
    /// The API server sums the value sizes of both sections, with
    /// `binaryData` counted after decoding.
    pub fn payload_size(&self) -> usize {
        let data: usize = self.data.values().map(String::len).sum();
        let binary: usize = self.binary_data.values().map(|v| decoded_len(v)).sum();
        data + binary
    }
}

/// Length of the bytes a padded base64 string decodes to
fn decoded_len(encoded: &str) -> usize {
    let padding = encoded.bytes().rev().take_while(|&b| b == b'=').count();
    (encoded.len() / 4 * 3).saturating_sub(padding)
}

impl ClusterResource for ConfigMap {
    const KIND: ResourceKind = ConfigMap::KIND;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}
