//! Build identifiers
//!
//! A build id is generated once per submission and every cluster document
//! belonging to that build is named after it. It has the shape
//! `<millis>-<suffix>`: a millisecond timestamp that never repeats within the
//! process followed by a random lowercase alphanumeric suffix. Both parts are
//! valid in DNS-1123 names, so the id can be embedded in object names as is.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Length of the random suffix
pub const SUFFIX_LEN: usize = 9;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Prefix of the pipeline run name; the config documents extend it
const PIPELINE_RUN_PREFIX: &str = "rpm-build-";

static LAST_MILLIS: AtomicU64 = AtomicU64::new(0);

/// Opaque identifier joining every document of one build
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(String);

impl BuildId {
    /// Generates a fresh identifier
    ///
    /// Never blocks and never fails. Two calls in the same process always get
    /// different timestamp components, even within one millisecond.
    pub fn generate() -> Self {
        let millis = next_millis();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();

        Self(format!("{}-{}", millis, suffix))
    }

    /// Wraps an existing identifier, e.g. one typed by a user
    ///
    /// A full pipeline run name (`rpm-build-<id>`) is accepted as well.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        Self::from_pipeline_run_name(raw).unwrap_or_else(|| Self(raw.to_string()))
    }

    /// Recovers the identifier from a pipeline run name
    pub fn from_pipeline_run_name(name: &str) -> Option<Self> {
        name.strip_prefix(PIPELINE_RUN_PREFIX)
            .filter(|id| !id.is_empty() && !id.starts_with("config-") && !id.starts_with("files-"))
            .map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name of the build-config ConfigMap
    pub fn config_map_name(&self) -> String {
        format!("rpm-build-config-{}", self.0)
    }

    /// Name of the ConfigMap holding the source file at `index`
    pub fn files_config_map_name(&self, index: usize) -> String {
        format!("rpm-build-files-{}-{}", self.0, index)
    }

    /// Name of the pipeline run executing the build
    pub fn pipeline_run_name(&self) -> String {
        format!("{}{}", PIPELINE_RUN_PREFIX, self.0)
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BuildId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Wall clock milliseconds, bumped past the last value handed out
fn next_millis() -> u64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_MILLIS.load(Ordering::Relaxed);

    loop {
        let next = now.max(last + 1);
        match LAST_MILLIS.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_shape() {
        let id = BuildId::generate();
        let (millis, suffix) = id.as_str().split_once('-').unwrap();

        assert!(millis.parse::<u64>().is_ok());
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(
            suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_generate_never_repeats_in_process() {
        let ids: HashSet<BuildId> = (0..1000).map(|_| BuildId::generate()).collect();
        assert_eq!(ids.len(), 1000);

        let stamps: HashSet<String> = ids
            .iter()
            .map(|id| id.as_str().split_once('-').unwrap().0.to_string())
            .collect();
        assert_eq!(stamps.len(), 1000);
    }

    #[test]
    fn test_resource_names() {
        let id = BuildId::new("1730123456789-abc123xyz");
        assert_eq!(id.config_map_name(), "rpm-build-config-1730123456789-abc123xyz");
        assert_eq!(
            id.files_config_map_name(0),
            "rpm-build-files-1730123456789-abc123xyz-0"
        );
        assert_eq!(id.pipeline_run_name(), "rpm-build-1730123456789-abc123xyz");
    }

    #[test]
    fn test_new_accepts_pipeline_run_name() {
        let id = BuildId::new(" rpm-build-1730123456789-abc123 ");
        assert_eq!(id.as_str(), "1730123456789-abc123");

        let id = BuildId::new("1730123456789-abc123");
        assert_eq!(id.as_str(), "1730123456789-abc123");
    }

    #[test]
    fn test_from_pipeline_run_name_rejects_config_names() {
        assert!(BuildId::from_pipeline_run_name("rpm-build-config-1-a").is_none());
        assert!(BuildId::from_pipeline_run_name("rpm-build-files-1-a-0").is_none());
        assert!(BuildId::from_pipeline_run_name("other-1-a").is_none());
        assert!(BuildId::from_pipeline_run_name("rpm-build-").is_none());
    }
}
