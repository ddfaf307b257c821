//! Target OS to build image resolution

use std::collections::BTreeMap;
use tracing::warn;

/// Image used for unknown target OS identifiers
pub const DEFAULT_IMAGE: &str = "quay.io/centos/centos:stream9";

/// Maps symbolic target OS identifiers to container images
///
/// The map is a plain value: the service receives one at construction and
/// tests can swap in their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMap {
    images: BTreeMap<String, String>,
    default_image: String,
}

impl ImageMap {
    /// An empty map that resolves every identifier to `default_image`
    pub fn new(default_image: impl Into<String>) -> Self {
        Self {
            images: BTreeMap::new(),
            default_image: default_image.into(),
        }
    }

    /// Adds or replaces one entry; identifiers are matched case-insensitively
    pub fn with_image(mut self, os: impl AsRef<str>, image: impl Into<String>) -> Self {
        self.images
            .insert(os.as_ref().trim().to_ascii_lowercase(), image.into());
        self
    }

    pub fn default_image(&self) -> &str {
        &self.default_image
    }

    /// Known identifiers and their images, sorted by identifier
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.images.iter().map(|(os, image)| (os.as_str(), image.as_str()))
    }

    /// Resolves a target OS to an image reference
    ///
    /// Values that already look like an image reference (registry path, tag
    /// or digest) pass through unchanged. Unknown identifiers fall back to the
    /// default image.
    pub fn resolve(&self, target_os: &str) -> String {
        let target_os = target_os.trim();

        if is_image_reference(target_os) {
            return target_os.to_string();
        }

        match self.images.get(&target_os.to_ascii_lowercase()) {
            Some(image) => image.clone(),
            None => {
                warn!(
                    target_os = %target_os,
                    image = %self.default_image,
                    "Unknown target OS, using default build image"
                );
                self.default_image.clone()
            }
        }
    }
}

impl Default for ImageMap {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE)
            .with_image("rhivos", "quay.io/centos/centos:stream9")
            .with_image("centos-stream9", "quay.io/centos/centos:stream9")
            .with_image("centos-stream10", "quay.io/centos/centos:stream10")
            .with_image("fedora", "registry.fedoraproject.org/fedora:latest")
            .with_image("rhel9", "registry.access.redhat.com/ubi9/ubi:latest")
            .with_image("rhel8", "registry.access.redhat.com/ubi8/ubi:latest")
    }
}

fn is_image_reference(value: &str) -> bool {
    value.contains(['/', ':', '@'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_reference_passes_through() {
        let images = ImageMap::default();
        assert_eq!(images.resolve("quay.io/foo:bar"), "quay.io/foo:bar");
        assert_eq!(images.resolve("fedora:40"), "fedora:40");
        assert_eq!(
            images.resolve("quay.io/foo@sha256:abcd"),
            "quay.io/foo@sha256:abcd"
        );
    }

    #[test]
    fn test_rhivos_maps_to_centos_stream9() {
        assert_eq!(
            ImageMap::default().resolve("rhivos"),
            "quay.io/centos/centos:stream9"
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(
            ImageMap::default().resolve(" Fedora "),
            "registry.fedoraproject.org/fedora:latest"
        );
    }

    #[test]
    fn test_unknown_os_uses_default() {
        let images = ImageMap::default();
        assert_eq!(images.resolve("unknown-os"), DEFAULT_IMAGE);
        assert_eq!(images.resolve(""), DEFAULT_IMAGE);
    }

    #[test]
    fn test_custom_map() {
        let images = ImageMap::new("registry.local/base:1").with_image("rhivos", "registry.local/rhivos:2");
        assert_eq!(images.resolve("rhivos"), "registry.local/rhivos:2");
        assert_eq!(images.resolve("fedora"), "registry.local/base:1");
        assert_eq!(images.default_image(), "registry.local/base:1");
        assert_eq!(
            images.entries().collect::<Vec<_>>(),
            vec![("rhivos", "registry.local/rhivos:2")]
        );
    }
}
