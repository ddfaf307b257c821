//! Desired-state documents for one build
//!
//! Pure constructors: given a build id, a request and a namespace they return
//! the documents to create, and nothing else. Only the changelog date in a
//! generated spec file depends on when they are called.

pub mod config_map;
pub mod pipeline_run;
pub mod spec_file;

pub use config_map::{
    build_config_resource, build_config_resource_on, request_from_config_map,
    source_file_resources,
};
pub use pipeline_run::pipeline_run_resource;
pub use spec_file::generate_spec_file;

use rpmb_core::domain::BuildId;
use rpmb_core::labels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the serialized request in the build-config document
pub const BUILD_CONFIG_KEY: &str = "build-config.json";

/// Key of the spec file in the build-config document
pub const SPEC_FILE_KEY: &str = "spec-file";

/// Pipeline parameter names, in the order they are sent
pub mod params {
    pub const PACKAGE_NAME: &str = "package-name";
    pub const PACKAGE_VERSION: &str = "package-version";
    pub const TARGET_OS: &str = "target-os";
    pub const ARCHITECTURE: &str = "architecture";
    pub const BUILD_ID: &str = "build-id";
    pub const SOURCE_TYPE: &str = "source-type";
    pub const GIT_REPOSITORY: &str = "git-repository";
    pub const GIT_BRANCH: &str = "git-branch";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const BUILD_OPTIONS: &str = "build-options";
}

/// The part of a request stored on the pipeline run annotation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTarget {
    #[serde(rename = "targetOS", default)]
    pub target_os: String,
    #[serde(default)]
    pub architecture: String,
}

/// Labels shared by every document of a build
///
/// # Arguments
/// * `component` - Role of the document (`build-config`, `source-files`, `pipeline-run`)
/// * `resource` - Lowercase kind (`configmap`, `pipelinerun`)
fn build_labels(id: &BuildId, component: &str, resource: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::BUILD_ID.to_string(), id.to_string()),
        (labels::APP.to_string(), labels::APP_NAME.to_string()),
        (labels::COMPONENT.to_string(), component.to_string()),
        (labels::K8S_NAME.to_string(), labels::APP_NAME.to_string()),
        (labels::K8S_COMPONENT.to_string(), resource.to_string()),
        (labels::K8S_PART_OF.to_string(), labels::PART_OF.to_string()),
    ])
}
