//! Build request validation
//!
//! Everything here runs before the first cluster call, so a rejected request
//! never leaves documents behind.

use rpmb_core::domain::{BuildRequest, BuildSource};
use rpmb_core::dto::ConfigMap;

use crate::error::{BuildError, Result};

/// Checks that a request has everything its source mode needs
pub fn validate_request(request: &BuildRequest) -> Result<()> {
    if request.name.trim().is_empty() {
        return Err(BuildError::Validation("Package name is required".to_string()));
    }

    if request.version.trim().is_empty() {
        return Err(BuildError::Validation("Package version is required".to_string()));
    }

    match &request.source {
        BuildSource::Upload { files } => {
            if files.is_empty() {
                return Err(BuildError::Validation(
                    "At least one source file is required for upload builds".to_string(),
                ));
            }

            for file in files {
                if !is_valid_key(&file.name) {
                    return Err(BuildError::Validation(format!(
                        "Invalid file name '{}': only letters, digits, '-', '_' and '.' are allowed",
                        file.name
                    )));
                }
            }
        }
        BuildSource::Git { repository, .. } => {
            if repository.trim().is_empty() {
                return Err(BuildError::Validation(
                    "Git repository URL is required for git builds".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Rejects a document the API server would refuse to store
pub fn check_document_size(document: &ConfigMap) -> Result<()> {
    let size = document.payload_size();

    if size > ConfigMap::MAX_SIZE_BYTES {
        return Err(BuildError::Validation(format!(
            "{} is {} bytes, above the {} byte limit",
            describe(document),
            size,
            ConfigMap::MAX_SIZE_BYTES
        )));
    }

    Ok(())
}

/// Names a document by the file it carries, if any
fn describe(document: &ConfigMap) -> String {
    match document.binary_data.keys().next() {
        Some(file) => format!("Source file '{}'", file),
        None => format!("Document {}", document.metadata.name),
    }
}

/// ConfigMap keys: `[-._a-zA-Z0-9]+`, not `.` or `..`
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
