//! Tekton PipelineRun document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::meta::{ClusterResource, ObjectMeta, ResourceKind};

/// Value of `spec.status` that asks Tekton to cancel a run
pub const CANCELLED_SPEC_STATUS: &str = "PipelineRunCancelled";

/// Condition type Tekton uses for overall completion
pub const SUCCEEDED_CONDITION: &str = "Succeeded";

/// Tekton PipelineRun
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PipelineRunSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PipelineRunStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunSpec {
    pub pipeline_ref: PipelineRef,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceBinding>,
    /// Run-level control field (`PipelineRunCancelled`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRef {
    pub name: String,
}

/// A name/value pipeline parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A workspace declared on the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_claim_template: Option<VolumeClaimTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClaimTemplate {
    pub spec: VolumeClaimSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeClaimSpec {
    pub access_modes: Vec<String>,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub requests: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSource {
    pub claim_name: String,
}

/// Status reported by Tekton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunStatus {
    #[serde(
        default,
        deserialize_with = "lenient_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A typed status condition
///
/// Missing fields read as empty and unparseable timestamps as absent, so an
/// odd condition never makes the whole run unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type", default)]
    pub condition_type: String,
    /// `True`, `False` or `Unknown`
    #[serde(default)]
    pub status: String,
    #[serde(
        default,
        deserialize_with = "lenient_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_transition_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    pub fn new(condition_type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: status.into(),
            last_transition_time: None,
            reason: None,
            message: None,
        }
    }
}

/// RFC 3339 timestamp, `None` for null or anything unparseable
fn lenient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;

    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

impl WorkspaceBinding {
    /// Workspace backed by a fresh volume claim of the given size
    pub fn volume_claim(
        name: impl Into<String>,
        access_mode: impl Into<String>,
        storage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            volume_claim_template: Some(VolumeClaimTemplate {
                spec: VolumeClaimSpec {
                    access_modes: vec![access_mode.into()],
                    resources: ResourceRequirements {
                        requests: BTreeMap::from([("storage".to_string(), storage.into())]),
                    },
                },
            }),
            persistent_volume_claim: None,
        }
    }
}

impl PipelineRun {
    pub const KIND: ResourceKind =
        ResourceKind::new("tekton.dev", "v1beta1", "PipelineRun", "pipelineruns");

    pub fn new(metadata: ObjectMeta, spec: PipelineRunSpec) -> Self {
        Self {
            api_version: Self::KIND.api_version(),
            kind: Self::KIND.kind.to_string(),
            metadata,
            spec,
            status: None,
        }
    }

    /// Value of the named parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.spec
            .params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.spec.status.as_deref() == Some(CANCELLED_SPEC_STATUS)
    }
}

impl ClusterResource for PipelineRun {
    const KIND: ResourceKind = PipelineRun::KIND;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}
