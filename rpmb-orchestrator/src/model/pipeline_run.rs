//! Pipeline run document

use rpmb_core::domain::{BuildId, BuildRequest};
use rpmb_core::dto::pipeline_run::{Param, PipelineRef, PipelineRunSpec, WorkspaceBinding};
use rpmb_core::dto::{ObjectMeta, PipelineRun};
use rpmb_core::labels;
use serde_json::Map;

use super::{BuildTarget, build_labels, params};
use crate::error::Result;
use crate::image::ImageMap;

pub const SOURCE_WORKSPACE: &str = "source-workspace";
pub const OUTPUT_WORKSPACE: &str = "output-workspace";

/// Fixed workspace sizes; they do not grow with the upload
pub const SOURCE_WORKSPACE_SIZE: &str = "1Gi";
pub const OUTPUT_WORKSPACE_SIZE: &str = "500Mi";

const ACCESS_MODE: &str = "ReadWriteOnce";

/// The run executing a build, named `rpm-build-{id}`
///
/// The target OS parameter carries the resolved build image, not the raw
/// identifier; the raw value is kept in the build-config annotation.
pub fn pipeline_run_resource(
    id: &BuildId,
    request: &BuildRequest,
    namespace: &str,
    pipeline_name: &str,
    images: &ImageMap,
) -> Result<PipelineRun> {
    let mut metadata = ObjectMeta::named(id.pipeline_run_name(), namespace)
        .with_labels(build_labels(id, "pipeline-run", "pipelinerun"));
    metadata
        .labels
        .insert(labels::PACKAGE_NAME.to_string(), request.name.clone());

    let target = BuildTarget {
        target_os: request.target_os.clone(),
        architecture: request.architecture.clone(),
    };
    metadata
        .annotations
        .insert(labels::BUILD_CONFIG.to_string(), serde_json::to_string(&target)?);

    let spec = PipelineRunSpec {
        pipeline_ref: PipelineRef {
            name: pipeline_name.to_string(),
        },
        params: vec![
            Param::new(params::PACKAGE_NAME, &request.name),
            Param::new(params::PACKAGE_VERSION, &request.version),
            Param::new(params::TARGET_OS, images.resolve(&request.target_os)),
            Param::new(params::ARCHITECTURE, &request.architecture),
            Param::new(params::BUILD_ID, id.as_str()),
            Param::new(params::SOURCE_TYPE, request.source_type()),
            Param::new(params::GIT_REPOSITORY, request.git_repository()),
            Param::new(params::GIT_BRANCH, request.git_branch()),
            Param::new(params::DEPENDENCIES, request.dependencies.join(",")),
            Param::new(params::BUILD_OPTIONS, request.build_options.join(" ")),
        ],
        workspaces: vec![
            WorkspaceBinding::volume_claim(SOURCE_WORKSPACE, ACCESS_MODE, SOURCE_WORKSPACE_SIZE),
            WorkspaceBinding::volume_claim(OUTPUT_WORKSPACE, ACCESS_MODE, OUTPUT_WORKSPACE_SIZE),
        ],
        status: None,
        extra: Map::new(),
    };

    Ok(PipelineRun::new(metadata, spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpmb_core::domain::{BuildSource, SourceFile};

    fn git_request() -> BuildRequest {
        BuildRequest {
            name: "gateway".to_string(),
            version: "1.5.2".to_string(),
            description: "Network gateway".to_string(),
            source: BuildSource::Git {
                repository: "https://github.com/automotive/gateway-service.git".to_string(),
                branch: Some("release-1.5".to_string()),
            },
            target_os: "rhivos".to_string(),
            architecture: "aarch64".to_string(),
            dependencies: vec!["iptables".to_string(), "systemd".to_string()],
            build_options: vec!["--enable-tls".to_string(), "--with-metrics".to_string()],
            spec_file: None,
        }
    }

    fn values(run: &PipelineRun) -> Vec<(&str, &str)> {
        run.spec
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.value.as_str()))
            .collect()
    }

    #[test]
    fn test_params_in_fixed_order() {
        let id = BuildId::new("1730123456789-abc123xyz");
        let run = pipeline_run_resource(
            &id,
            &git_request(),
            "builds",
            "rpm-build-pipeline",
            &ImageMap::default(),
        )
        .unwrap();

        assert_eq!(
            values(&run),
            vec![
                ("package-name", "gateway"),
                ("package-version", "1.5.2"),
                ("target-os", "quay.io/centos/centos:stream9"),
                ("architecture", "aarch64"),
                ("build-id", "1730123456789-abc123xyz"),
                ("source-type", "git"),
                (
                    "git-repository",
                    "https://github.com/automotive/gateway-service.git"
                ),
                ("git-branch", "release-1.5"),
                ("dependencies", "iptables,systemd"),
                ("build-options", "--enable-tls --with-metrics"),
            ]
        );
    }

    #[test]
    fn test_upload_build_defaults() {
        let mut request = git_request();
        request.source = BuildSource::Upload {
            files: vec![SourceFile::from_bytes("a.txt", b"0123456789")],
        };
        request.dependencies.clear();
        request.build_options.clear();

        let run = pipeline_run_resource(
            &BuildId::new("1-a"),
            &request,
            "builds",
            "rpm-build-pipeline",
            &ImageMap::default(),
        )
        .unwrap();

        assert_eq!(run.param("source-type"), Some("upload"));
        assert_eq!(run.param("git-repository"), Some(""));
        assert_eq!(run.param("git-branch"), Some("main"));
        assert_eq!(run.param("dependencies"), Some(""));
        assert_eq!(run.param("build-options"), Some(""));
    }

    #[test]
    fn test_metadata_and_workspaces() {
        let id = BuildId::new("1730123456789-abc123xyz");
        let run = pipeline_run_resource(
            &id,
            &git_request(),
            "builds",
            "custom-pipeline",
            &ImageMap::default(),
        )
        .unwrap();

        assert_eq!(run.api_version, "tekton.dev/v1beta1");
        assert_eq!(run.metadata.name, "rpm-build-1730123456789-abc123xyz");
        assert_eq!(run.spec.pipeline_ref.name, "custom-pipeline");
        assert_eq!(run.metadata.label(labels::PACKAGE_NAME), Some("gateway"));
        assert_eq!(run.metadata.label(labels::K8S_COMPONENT), Some("pipelinerun"));
        assert_eq!(
            run.metadata.annotation(labels::BUILD_CONFIG),
            Some(r#"{"targetOS":"rhivos","architecture":"aarch64"}"#)
        );

        let json = serde_json::to_value(&run.spec.workspaces).unwrap();
        assert_eq!(json[0]["name"], "source-workspace");
        assert_eq!(
            json[0]["volumeClaimTemplate"]["spec"]["resources"]["requests"]["storage"],
            "1Gi"
        );
        assert_eq!(json[1]["name"], "output-workspace");
        assert_eq!(
            json[1]["volumeClaimTemplate"]["spec"]["accessModes"][0],
            "ReadWriteOnce"
        );
        assert_eq!(
            json[1]["volumeClaimTemplate"]["spec"]["resources"]["requests"]["storage"],
            "500Mi"
        );
    }

    #[test]
    fn test_custom_image_map() {
        let images = ImageMap::new("registry.local/base:1");
        let run = pipeline_run_resource(
            &BuildId::new("1-a"),
            &git_request(),
            "builds",
            "rpm-build-pipeline",
            &images,
        )
        .unwrap();

        assert_eq!(run.param("target-os"), Some("registry.local/base:1"));
    }
}
