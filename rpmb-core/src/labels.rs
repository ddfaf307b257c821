//! Label and annotation keys
//!
//! These names are part of the on-cluster contract. Every document created
//! for a build carries them, and builds are found again only through them,
//! so changing any value orphans existing builds.

/// Label binding a document to its build identifier
pub const BUILD_ID: &str = "rpm-builder.io/build-id";

/// Label carrying the package name on the pipeline run
pub const PACKAGE_NAME: &str = "rpm-builder.io/package-name";

/// Label carrying the position of a source file document
pub const FILE_INDEX: &str = "rpm-builder.io/file-index";

/// Annotation holding the serialized target OS / architecture pair
pub const BUILD_CONFIG: &str = "rpm-builder.io/build-config";

/// Build job annotation for the target OS
pub const TARGET_OS: &str = "rpm-builder.io/target-os";

/// Build job annotation for the target architecture
pub const ARCHITECTURE: &str = "rpm-builder.io/architecture";

/// Label Tekton puts on every pod spawned for a pipeline run
pub const TEKTON_PIPELINE_RUN: &str = "tekton.dev/pipelineRun";

pub const APP: &str = "app";
pub const COMPONENT: &str = "component";
pub const K8S_NAME: &str = "app.kubernetes.io/name";
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

pub const APP_NAME: &str = "rpm-builder";
pub const PART_OF: &str = "rpm-builder-plugin";
