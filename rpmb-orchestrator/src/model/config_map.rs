//! Build-config and source file documents

use chrono::{NaiveDate, Utc};
use rpmb_core::domain::{BuildId, BuildRequest, SourceFile};
use rpmb_core::dto::{ConfigMap, ObjectMeta};
use rpmb_core::labels;

use super::spec_file::generate_spec_file;
use super::{BUILD_CONFIG_KEY, SPEC_FILE_KEY, build_labels};
use crate::error::{BuildError, Result};

/// Document holding the request and the spec file, named `rpm-build-config-{id}`
pub fn build_config_resource(
    id: &BuildId,
    request: &BuildRequest,
    namespace: &str,
) -> Result<ConfigMap> {
    build_config_resource_on(id, request, namespace, Utc::now().date_naive())
}

/// Same as [`build_config_resource`] with a fixed changelog date
pub fn build_config_resource_on(
    id: &BuildId,
    request: &BuildRequest,
    namespace: &str,
    date: NaiveDate,
) -> Result<ConfigMap> {
    let metadata = ObjectMeta::named(id.config_map_name(), namespace).with_labels(build_labels(
        id,
        "build-config",
        "configmap",
    ));

    let spec_file = match &request.spec_file {
        Some(custom) if !custom.trim().is_empty() => custom.clone(),
        _ => generate_spec_file(request, date),
    };

    let mut config_map = ConfigMap::new(metadata);
    config_map.data.insert(
        BUILD_CONFIG_KEY.to_string(),
        serde_json::to_string_pretty(&request.manifest())?,
    );
    config_map.data.insert(SPEC_FILE_KEY.to_string(), spec_file);

    Ok(config_map)
}

/// One document per uploaded file, named `rpm-build-files-{id}-{index}`
///
/// The payload is stored base64 encoded under the original file name.
pub fn source_file_resources(id: &BuildId, files: &[SourceFile], namespace: &str) -> Vec<ConfigMap> {
    files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let mut meta = ObjectMeta::named(id.files_config_map_name(index), namespace)
                .with_labels(build_labels(id, "source-files", "configmap"));
            meta.labels
                .insert(labels::FILE_INDEX.to_string(), index.to_string());

            let mut config_map = ConfigMap::new(meta);
            config_map
                .binary_data
                .insert(file.name.clone(), file.content.clone());
            config_map
        })
        .collect()
}

/// Reads the request back from a build-config document
///
/// File payloads are not part of it; only names and sizes are.
pub fn request_from_config_map(config_map: &ConfigMap) -> Result<BuildRequest> {
    let raw = config_map.data.get(BUILD_CONFIG_KEY).ok_or_else(|| {
        BuildError::Serialization(format!(
            "{} has no {} entry",
            config_map.metadata.name, BUILD_CONFIG_KEY
        ))
    })?;

    let mut request: BuildRequest = serde_json::from_str(raw)?;
    if request.spec_file.is_none() {
        request.spec_file = config_map.data.get(SPEC_FILE_KEY).cloned();
    }

    Ok(request)
}
