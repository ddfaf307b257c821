//! RPM Builder Orchestrator
//!
//! Turns a build request into cluster documents, submits them, and maps the
//! status Tekton reports back onto a four-state build lifecycle.
//!
//! Architecture:
//! - Configuration: settings from the environment or defaults
//! - Model: pure builders for the desired-state documents of one build
//! - Status: translation of PipelineRun conditions into build phases
//! - Services: build submission, lookup, listing, cancellation and logs
//! - Scheduler: per-build status polling until a terminal phase
//!
//! All cluster access goes through [`rpmb_client::ClusterGateway`], so any
//! gateway (including an in-memory one in tests) can drive the service.

pub mod config;
pub mod error;
pub mod image;
pub mod model;
pub mod namespace;
pub mod scheduler;
pub mod service;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{BuildError, Result};
pub use image::ImageMap;
pub use namespace::NamespaceResolver;
pub use scheduler::{BuildPoller, PollOutcome};
pub use service::BuildService;
