//! Service Module
//!
//! Business logic layer for the orchestrator. Services validate requests,
//! turn them into documents and drive the cluster gateway.

pub mod build;
pub mod validation;

pub use build::{BuildDocuments, BuildService, NO_LOGS_MESSAGE};
pub use validation::{check_document_size, validate_request};
