//! Build job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::build::BuildRequest;
use crate::domain::build_id::BuildId;
use crate::labels;

/// A build as seen by the user
///
/// The cluster owns the durable record (the pipeline run); a `BuildJob` is
/// only the projection of it taken at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildJob {
    /// Pipeline run name
    pub name: String,
    pub namespace: String,
    pub build_id: BuildId,
    pub package_name: String,
    pub target_os: String,
    pub architecture: String,
    /// The full request; only known when the job was just submitted or the
    /// build-config document was read back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<BuildRequest>,
    pub status: BuildStatus,
}

/// Status projection of a build job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatus {
    pub phase: BuildPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,
}

/// Build job lifecycle
///
/// `Pending -> Running -> {Succeeded | Failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl BuildPhase {
    /// Whether no further transition can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildPhase::Succeeded | BuildPhase::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildPhase::Pending => "Pending",
            BuildPhase::Running => "Running",
            BuildPhase::Succeeded => "Succeeded",
            BuildPhase::Failed => "Failed",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BuildStatus {
    pub fn pending() -> Self {
        Self {
            phase: BuildPhase::Pending,
            start_time: None,
            completion_time: None,
        }
    }
}

impl BuildJob {
    /// Projection of a freshly submitted build
    pub fn submitted(build_id: BuildId, namespace: impl Into<String>, request: BuildRequest) -> Self {
        Self {
            name: build_id.pipeline_run_name(),
            namespace: namespace.into(),
            package_name: request.name.clone(),
            target_os: request.target_os.clone(),
            architecture: request.architecture.clone(),
            build_id,
            request: Some(request),
            status: BuildStatus::pending(),
        }
    }

    pub fn phase(&self) -> BuildPhase {
        self.status.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.status.phase.is_terminal()
    }

    /// Labels identifying the job
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (labels::BUILD_ID.to_string(), self.build_id.to_string()),
            (labels::PACKAGE_NAME.to_string(), self.package_name.clone()),
        ])
    }

    /// Annotations describing the build target
    pub fn annotations(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (labels::TARGET_OS.to_string(), self.target_os.clone()),
            (labels::ARCHITECTURE.to_string(), self.architecture.clone()),
        ])
    }
}
