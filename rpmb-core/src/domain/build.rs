//! Build request domain types

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Branch used when a git build does not name one
pub const DEFAULT_GIT_BRANCH: &str = "main";

/// A package build as described by the user
///
/// Serialized with the camelCase field names stored in the build-config
/// document, so documents written by other clients read back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub source: BuildSource,
    #[serde(rename = "targetOS")]
    pub target_os: String,
    pub architecture: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub build_options: Vec<String>,
    /// Custom spec file; a default one is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_file: Option<String>,
}

/// Where the package sources come from
///
/// Exactly one mode is active. The `sourceType` tag is flattened into the
/// surrounding request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sourceType", rename_all = "lowercase")]
pub enum BuildSource {
    /// Files uploaded alongside the request
    Upload {
        #[serde(default)]
        files: Vec<SourceFile>,
    },
    /// A git repository checked out by the pipeline
    Git {
        #[serde(rename = "gitRepository", default)]
        repository: String,
        #[serde(
            rename = "gitBranch",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        branch: Option<String>,
    },
}

/// One uploaded source file
///
/// `content` holds the base64 encoding of the file bytes, which is what the
/// `binaryData` section of a ConfigMap expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

impl SourceFile {
    /// Creates a source file from raw bytes, encoding them for storage
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content: STANDARD.encode(bytes),
        }
    }

    /// Size of the encoded payload in bytes
    pub fn encoded_len(&self) -> usize {
        self.content.len()
    }

    /// Decodes the stored payload back into raw bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.content)
    }
}

impl BuildRequest {
    /// Value of the `sourceType` tag
    pub fn source_type(&self) -> &'static str {
        match self.source {
            BuildSource::Upload { .. } => "upload",
            BuildSource::Git { .. } => "git",
        }
    }

    /// Uploaded files, empty for git builds
    pub fn files(&self) -> &[SourceFile] {
        match &self.source {
            BuildSource::Upload { files } => files,
            BuildSource::Git { .. } => &[],
        }
    }

    /// Repository URL, empty for upload builds
    pub fn git_repository(&self) -> &str {
        match &self.source {
            BuildSource::Git { repository, .. } => repository,
            BuildSource::Upload { .. } => "",
        }
    }

    /// Branch to build, `main` unless the request names one
    pub fn git_branch(&self) -> &str {
        match &self.source {
            BuildSource::Git {
                branch: Some(branch),
                ..
            } if !branch.trim().is_empty() => branch,
            _ => DEFAULT_GIT_BRANCH,
        }
    }

    /// Summary line for the package: the description or the name
    pub fn summary(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    /// Copy of the request with file payloads stripped
    ///
    /// Payloads live in their own documents; the manifest keeps only file
    /// names and sizes so the build-config document stays small.
    pub fn manifest(&self) -> Self {
        let mut manifest = self.clone();
        if let BuildSource::Upload { files } = &mut manifest.source {
            for file in files.iter_mut() {
                file.content.clear();
            }
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_request() -> BuildRequest {
        BuildRequest {
            name: "gateway".to_string(),
            version: "1.5.2".to_string(),
            description: String::new(),
            source: BuildSource::Git {
                repository: "https://github.com/automotive/gateway-service.git".to_string(),
                branch: None,
            },
            target_os: "rhivos".to_string(),
            architecture: "aarch64".to_string(),
            dependencies: vec!["iptables".to_string()],
            build_options: vec!["--enable-tls".to_string()],
            spec_file: None,
        }
    }

    #[test]
    fn test_source_file_encoding() {
        let file = SourceFile::from_bytes("a.txt", b"0123456789");
        assert_eq!(file.size, 10);
        assert_eq!(file.content, "MDEyMzQ1Njc4OQ==");
        assert_eq!(file.decode().unwrap(), b"0123456789");
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(git_request()).unwrap();
        assert_eq!(json["sourceType"], "git");
        assert_eq!(
            json["gitRepository"],
            "https://github.com/automotive/gateway-service.git"
        );
        assert_eq!(json["targetOS"], "rhivos");
        assert_eq!(json["buildOptions"][0], "--enable-tls");
        assert!(json.get("gitBranch").is_none());
        assert!(json.get("specFile").is_none());
    }

    #[test]
    fn test_deserialize_upload_request() {
        let json = r#"{
            "name": "demo",
            "version": "1.0.0",
            "description": "",
            "sourceType": "upload",
            "files": [{"name": "a.txt", "size": 10, "content": "MDEyMzQ1Njc4OQ=="}],
            "targetOS": "rhivos",
            "architecture": "aarch64",
            "dependencies": [],
            "buildOptions": []
        }"#;

        let request: BuildRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.source_type(), "upload");
        assert_eq!(request.files().len(), 1);
        assert_eq!(request.git_repository(), "");
    }

    #[test]
    fn test_git_branch_defaults_to_main() {
        let mut request = git_request();
        assert_eq!(request.git_branch(), "main");

        request.source = BuildSource::Git {
            repository: "https://example.com/repo.git".to_string(),
            branch: Some("release-1.5".to_string()),
        };
        assert_eq!(request.git_branch(), "release-1.5");
    }

    #[test]
    fn test_summary_falls_back_to_name() {
        let mut request = git_request();
        assert_eq!(request.summary(), "gateway");

        request.description = "Network gateway".to_string();
        assert_eq!(request.summary(), "Network gateway");
    }

    #[test]
    fn test_manifest_strips_payloads() {
        let mut request = git_request();
        request.source = BuildSource::Upload {
            files: vec![SourceFile::from_bytes("a.txt", b"hello")],
        };

        let manifest = request.manifest();
        assert_eq!(manifest.files()[0].name, "a.txt");
        assert_eq!(manifest.files()[0].size, 5);
        assert!(manifest.files()[0].content.is_empty());

        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json["files"][0].get("content").is_none());
    }
}
