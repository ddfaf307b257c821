//! RPM Builder Core
//!
//! Core types and abstractions for the RPM builder.
//!
//! This crate contains:
//! - Domain types: build requests, build identifiers and build jobs
//! - DTOs: the cluster documents (ConfigMaps, PipelineRuns, Pods) exchanged
//!   with the Kubernetes API
//! - Labels: the fixed label and annotation keys that tie those documents
//!   to a single build

pub mod domain;
pub mod dto;
pub mod labels;
