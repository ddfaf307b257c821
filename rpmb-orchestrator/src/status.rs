//! PipelineRun status translation
//!
//! Tekton reports progress as a loosely typed list of conditions. The
//! observation is first narrowed to an [`ExecutionState`], then mapped onto a
//! [`BuildPhase`] by a total function, so every condition set yields exactly
//! one phase and `Running` is the answer for anything ambiguous.

use rpmb_core::domain::{BuildId, BuildJob, BuildPhase, BuildStatus};
use rpmb_core::dto::PipelineRun;
use rpmb_core::dto::pipeline_run::{PipelineRunStatus, SUCCEEDED_CONDITION};
use rpmb_core::labels;

use crate::model::{BuildTarget, params};

/// What the execution engine has reported about a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    /// No status block yet
    Absent,
    /// A status block without a completion condition
    InProgress,
    /// A completion condition with its truth value
    Completed(Completion),
}

/// Value of the completion condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    True,
    False,
    /// `Unknown` or anything else the engine may report
    Other(String),
}

impl ExecutionState {
    pub fn observe(status: Option<&PipelineRunStatus>) -> Self {
        let Some(status) = status else {
            return Self::Absent;
        };

        match status
            .conditions
            .iter()
            .find(|c| c.condition_type == SUCCEEDED_CONDITION)
        {
            None => Self::InProgress,
            Some(condition) => Self::Completed(match condition.status.as_str() {
                "True" => Completion::True,
                "False" => Completion::False,
                other => Completion::Other(other.to_string()),
            }),
        }
    }
}

/// Maps an observed state onto the build lifecycle
pub fn translate(state: &ExecutionState) -> BuildPhase {
    match state {
        ExecutionState::Absent => BuildPhase::Pending,
        ExecutionState::InProgress => BuildPhase::Running,
        ExecutionState::Completed(Completion::True) => BuildPhase::Succeeded,
        ExecutionState::Completed(Completion::False) => BuildPhase::Failed,
        ExecutionState::Completed(Completion::Other(_)) => BuildPhase::Running,
    }
}

/// Phase of a pipeline run
pub fn phase_of(run: &PipelineRun) -> BuildPhase {
    translate(&ExecutionState::observe(run.status.as_ref()))
}

/// Projects a pipeline run onto a build job
///
/// Only the target OS and architecture survive on the run itself (in the
/// build-config annotation); the full request lives in the build-config
/// document, so `request` is left empty here.
pub fn project(run: &PipelineRun, fallback_namespace: &str) -> BuildJob {
    let meta = &run.metadata;

    let build_id = meta
        .label(labels::BUILD_ID)
        .map(BuildId::new)
        .or_else(|| BuildId::from_pipeline_run_name(&meta.name))
        .unwrap_or_else(|| BuildId::new(&meta.name));

    let package_name = meta
        .label(labels::PACKAGE_NAME)
        .or_else(|| run.param(params::PACKAGE_NAME))
        .unwrap_or_default()
        .to_string();

    // Runs created by hand may carry no annotation or a malformed one
    let target = meta
        .annotation(labels::BUILD_CONFIG)
        .and_then(|raw| serde_json::from_str::<BuildTarget>(raw).ok())
        .unwrap_or_default();

    BuildJob {
        name: meta.name.clone(),
        namespace: meta
            .namespace
            .clone()
            .unwrap_or_else(|| fallback_namespace.to_string()),
        build_id,
        package_name,
        target_os: target.target_os,
        architecture: target.architecture,
        request: None,
        status: BuildStatus {
            phase: phase_of(run),
            start_time: run.status.as_ref().and_then(|s| s.start_time),
            completion_time: run.status.as_ref().and_then(|s| s.completion_time),
        },
    }
}
