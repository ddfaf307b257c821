//! Cluster documents
//!
//! Typed views of the Kubernetes and Tekton objects the RPM builder writes
//! and reads. Only the fields the builder cares about are modelled; every
//! object keeps unknown fields in a flattened map so a read-modify-write
//! cycle never drops data added by a newer API server.

pub mod config_map;
pub mod meta;
pub mod pipeline_run;
pub mod pod;

pub use config_map::ConfigMap;
pub use meta::{ClusterResource, ObjectList, ObjectMeta, ResourceKind};
pub use pipeline_run::PipelineRun;
pub use pod::Pod;
