//! Core domain types
//!
//! This module contains the domain structures shared by the orchestration
//! library and the CLI. They describe what a user asked for (a build request),
//! how that request is identified on the cluster (a build id) and what the
//! user sees while it runs (a build job).

pub mod build;
pub mod build_id;
pub mod job;

pub use build::{BuildRequest, BuildSource, SourceFile};
pub use build_id::BuildId;
pub use job::{BuildJob, BuildPhase, BuildStatus};
