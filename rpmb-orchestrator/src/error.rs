//! Build orchestration errors

use rpmb_client::ClientError;
use rpmb_core::domain::{BuildId, BuildPhase};
use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors surfaced by the build service
#[derive(Debug, Error)]
pub enum BuildError {
    /// The request is incomplete or too large; nothing was sent to the cluster
    #[error("Invalid build request: {0}")]
    Validation(String),

    /// No namespace could be resolved; nothing was sent to the cluster
    #[error("{0}")]
    Namespace(String),

    /// A cluster call failed
    #[error("Failed to {step}: {source}")]
    Gateway {
        /// What was being done, e.g. "create ConfigMap rpm-build-config-..."
        step: String,
        #[source]
        source: ClientError,
    },

    /// No pipeline run exists for the build
    #[error("Build not found: {0}")]
    NotFound(BuildId),

    /// The build already reached a terminal phase
    #[error("Build {id} already finished ({phase})")]
    AlreadyFinished { id: BuildId, phase: BuildPhase },

    /// A document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BuildError {
    pub fn gateway(step: impl Into<String>, source: ClientError) -> Self {
        Self::Gateway {
            step: step.into(),
            source,
        }
    }

    /// Whether retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Gateway { source, .. } => !source.is_client_error() || source.is_not_found(),
            Self::NotFound(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
