//! Build Service
//!
//! Business logic for build submission and everything done with a build
//! afterwards: status lookups, listing, cancellation, logs and reading the
//! original request back.

use rpmb_client::{ClientError, ClusterGateway, Resources};
use rpmb_core::domain::{BuildId, BuildJob, BuildRequest, BuildSource};
use rpmb_core::dto::pipeline_run::CANCELLED_SPEC_STATUS;
use rpmb_core::dto::{ClusterResource, ConfigMap, PipelineRun, Pod};
use rpmb_core::labels;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{BuildError, Result};
use crate::image::ImageMap;
use crate::model;
use crate::namespace::NamespaceResolver;
use crate::service::validation::{check_document_size, validate_request};
use crate::status;

/// Returned by [`BuildService::logs`] while no pod has been scheduled
pub const NO_LOGS_MESSAGE: &str = "No logs available yet.";

/// Every document created for one build, in creation order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDocuments {
    pub build_config: ConfigMap,
    pub source_files: Vec<ConfigMap>,
    pub pipeline_run: PipelineRun,
}

/// Orchestrates builds on one cluster
pub struct BuildService {
    gateway: Arc<dyn ClusterGateway>,
    namespaces: NamespaceResolver,
    images: ImageMap,
    pipeline_name: String,
}

impl BuildService {
    pub fn new(gateway: Arc<dyn ClusterGateway>, config: &Config) -> Self {
        Self {
            gateway,
            namespaces: NamespaceResolver::from_config(config),
            images: ImageMap::default(),
            pipeline_name: config.pipeline_name.clone(),
        }
    }

    /// Replace the target OS to image table
    pub fn with_images(mut self, images: ImageMap) -> Self {
        self.images = images;
        self
    }

    pub fn with_namespaces(mut self, namespaces: NamespaceResolver) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn resolve_namespace(&self, explicit: Option<&str>) -> Result<String> {
        self.namespaces.resolve(explicit)
    }

    /// Validates a request and renders every document of its build without
    /// creating any
    pub fn render(
        &self,
        build_id: &BuildId,
        request: &BuildRequest,
        namespace: &str,
    ) -> Result<BuildDocuments> {
        validate_request(request)?;
        self.render_documents(build_id, request, namespace)
    }

    /// Renders and size-checks the documents of an already validated request
    fn render_documents(
        &self,
        build_id: &BuildId,
        request: &BuildRequest,
        namespace: &str,
    ) -> Result<BuildDocuments> {
        let documents = BuildDocuments {
            build_config: model::build_config_resource(build_id, request, namespace)?,
            source_files: model::source_file_resources(build_id, request.files(), namespace),
            pipeline_run: model::pipeline_run_resource(
                build_id,
                request,
                namespace,
                &self.pipeline_name,
                &self.images,
            )?,
        };

        for document in documents.source_files.iter() {
            check_document_size(document)?;
        }
        check_document_size(&documents.build_config)?;

        Ok(documents)
    }

    /// Submit a build
    ///
    /// Creates the build-config document, one document per source file and
    /// the pipeline run, in that order. The first failure aborts the rest;
    /// documents created before it are left in place.
    pub async fn submit(&self, request: BuildRequest, namespace: Option<&str>) -> Result<BuildJob> {
        validate_request(&request)?;
        let namespace = self.resolve_namespace(namespace)?;

        let build_id = BuildId::generate();
        let documents = self.render_documents(&build_id, &request, &namespace)?;

        info!(
            build_id = %build_id,
            namespace = %namespace,
            "Submitting build for {} {}",
            request.name,
            request.version
        );

        if let Err(e) = self.create_documents(&documents, &namespace).await {
            error!(build_id = %build_id, namespace = %namespace, "Build submission failed: {}", e);
            return Err(e);
        }

        info!(build_id = %build_id, "Build submitted: {}", build_id.pipeline_run_name());

        Ok(BuildJob::submitted(build_id, namespace, request))
    }

    async fn create_documents(&self, documents: &BuildDocuments, namespace: &str) -> Result<()> {
        self.create(namespace, &documents.build_config).await?;
        for document in &documents.source_files {
            self.create(namespace, document).await?;
        }
        self.create(namespace, &documents.pipeline_run).await?;

        Ok(())
    }

    async fn create<K: ClusterResource>(&self, namespace: &str, object: &K) -> Result<K> {
        let name = &object.metadata().name;

        let created = Resources::<K>::namespaced(self.gateway.as_ref(), namespace)
            .create(object)
            .await
            .map_err(|e| BuildError::gateway(format!("create {} {}", K::KIND.kind, name), e))?;

        info!(namespace = %namespace, "Created {} {}", K::KIND.kind, name);
        Ok(created)
    }

    /// Current state of a build
    pub async fn status(&self, build_id: &BuildId, namespace: Option<&str>) -> Result<BuildJob> {
        let namespace = self.resolve_namespace(namespace)?;
        let run = self.pipeline_run(build_id, &namespace).await?;

        Ok(status::project(&run, &namespace))
    }

    /// Every build in a namespace, newest first
    pub async fn list(&self, namespace: Option<&str>) -> Result<Vec<BuildJob>> {
        let namespace = self.resolve_namespace(namespace)?;

        let runs = Resources::<PipelineRun>::namespaced(self.gateway.as_ref(), &namespace)
            .list(Some(labels::BUILD_ID))
            .await
            .map_err(|e| BuildError::gateway("list PipelineRuns", e))?;

        let mut jobs: Vec<BuildJob> = runs
            .iter()
            .map(|run| status::project(run, &namespace))
            .collect();
        jobs.sort_by(|a, b| b.build_id.cmp(&a.build_id));

        Ok(jobs)
    }

    /// Ask Tekton to stop a running build
    ///
    /// The run is marked cancelled, not deleted. Asking twice is harmless.
    pub async fn cancel(&self, build_id: &BuildId, namespace: Option<&str>) -> Result<BuildJob> {
        let namespace = self.resolve_namespace(namespace)?;
        let mut run = self.pipeline_run(build_id, &namespace).await?;

        let phase = status::phase_of(&run);
        if phase.is_terminal() {
            return Err(BuildError::AlreadyFinished {
                id: build_id.clone(),
                phase,
            });
        }

        if run.is_cancel_requested() {
            debug!(build_id = %build_id, "Cancellation already requested");
            return Ok(status::project(&run, &namespace));
        }

        run.spec.status = Some(CANCELLED_SPEC_STATUS.to_string());
        let updated = Resources::<PipelineRun>::namespaced(self.gateway.as_ref(), &namespace)
            .update(&run)
            .await
            .map_err(|e| {
                BuildError::gateway(format!("update PipelineRun {}", run.metadata.name), e)
            })?;

        info!(build_id = %build_id, namespace = %namespace, "Build cancellation requested");

        Ok(status::project(&updated, &namespace))
    }

    /// Log text of every container the build has run so far
    pub async fn logs(&self, build_id: &BuildId, namespace: Option<&str>) -> Result<String> {
        let namespace = self.resolve_namespace(namespace)?;
        let selector = format!(
            "{}={}",
            labels::TEKTON_PIPELINE_RUN,
            build_id.pipeline_run_name()
        );

        let mut pods = Resources::<Pod>::namespaced(self.gateway.as_ref(), &namespace)
            .list(Some(&selector))
            .await
            .map_err(|e| BuildError::gateway("list Pods", e))?;

        if pods.is_empty() {
            return Ok(NO_LOGS_MESSAGE.to_string());
        }
        pods.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));

        let mut output = String::new();
        for pod in &pods {
            let pod_name = &pod.metadata.name;
            let containers = pod.container_names();

            if containers.is_empty() {
                let text = self.container_logs(&namespace, pod_name, None).await?;
                append_section(&mut output, pod_name, text);
                continue;
            }

            for container in containers {
                let text = self
                    .container_logs(&namespace, pod_name, Some(container))
                    .await?;
                append_section(&mut output, &format!("{}/{}", pod_name, container), text);
            }
        }

        if output.is_empty() {
            return Ok(NO_LOGS_MESSAGE.to_string());
        }

        Ok(output)
    }

    /// Logs of one container; `None` when the container has not started
    async fn container_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
    ) -> Result<Option<String>> {
        match self.gateway.logs(namespace, pod, container).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.is_client_error() => {
                debug!(pod = %pod, container = ?container, "No logs yet: {}", e);
                Ok(None)
            }
            Err(e) => Err(BuildError::gateway(format!("fetch logs of pod {}", pod), e)),
        }
    }

    /// The request a build was submitted with
    ///
    /// The build-config document holds the request without file payloads;
    /// each payload is read back from its own source file document.
    pub async fn request(&self, build_id: &BuildId, namespace: Option<&str>) -> Result<BuildRequest> {
        let namespace = self.resolve_namespace(namespace)?;
        let config_maps = Resources::<ConfigMap>::namespaced(self.gateway.as_ref(), &namespace);
        let name = build_id.config_map_name();

        let config_map = config_maps
            .get(&name)
            .await
            .map_err(|e| not_found_or(build_id, format!("get ConfigMap {}", name), e))?;

        let mut request = model::request_from_config_map(&config_map)?;

        if let BuildSource::Upload { files } = &mut request.source {
            for (index, file) in files.iter_mut().enumerate() {
                let name = build_id.files_config_map_name(index);
                let document = config_maps
                    .get(&name)
                    .await
                    .map_err(|e| BuildError::gateway(format!("get ConfigMap {}", name), e))?;

                file.content = document.binary_data.get(&file.name).cloned().ok_or_else(|| {
                    BuildError::Serialization(format!("{} has no entry for {}", name, file.name))
                })?;
            }
        }

        Ok(request)
    }

    async fn pipeline_run(&self, build_id: &BuildId, namespace: &str) -> Result<PipelineRun> {
        let name = build_id.pipeline_run_name();

        Resources::<PipelineRun>::namespaced(self.gateway.as_ref(), namespace)
            .get(&name)
            .await
            .map_err(|e| not_found_or(build_id, format!("get PipelineRun {}", name), e))
    }
}

fn not_found_or(build_id: &BuildId, step: String, err: ClientError) -> BuildError {
    if err.is_not_found() {
        BuildError::NotFound(build_id.clone())
    } else {
        BuildError::gateway(step, err)
    }
}

fn append_section(output: &mut String, title: &str, text: Option<String>) {
    let Some(text) = text else {
        return;
    };

    output.push_str(&format!("==> {} <==\n", title));
    output.push_str(&text);
    if !text.ends_with('\n') {
        output.push('\n');
    }
}
