//! Namespace resolution
//!
//! A build is never submitted to a namespace the operator did not pick. The
//! namespace comes from, in order: the caller, the console location the user
//! is looking at, the configured default. If none of them names one the call
//! fails before touching the cluster.

use crate::config::Config;
use crate::error::{BuildError, Result};

/// Value the console uses for "all namespaces"
pub const ALL_NAMESPACES: &str = "#ALL_NS#";

/// Picks the namespace for a call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceResolver {
    context_path: Option<String>,
    default_namespace: Option<String>,
}

impl NamespaceResolver {
    /// # Arguments
    /// * `context_path` - Console location, e.g. `/k8s/ns/builds/pipelineruns`
    /// * `default_namespace` - Namespace used when nothing else names one
    pub fn new(context_path: Option<String>, default_namespace: Option<String>) -> Self {
        Self {
            context_path,
            default_namespace,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.console_path.clone(), config.default_namespace.clone())
    }

    /// Resolves the namespace for a call
    pub fn resolve(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(namespace) = explicit.and_then(usable) {
            return Ok(namespace.to_string());
        }

        if let Some(namespace) = self.context_path.as_deref().and_then(namespace_from_path) {
            return Ok(namespace.to_string());
        }

        if let Some(namespace) = self.default_namespace.as_deref().and_then(usable) {
            return Ok(namespace.to_string());
        }

        Err(BuildError::Namespace(
            "No namespace selected. Select a project in the console, pass --namespace, \
             or set RPMB_NAMESPACE"
                .to_string(),
        ))
    }
}

/// Extracts the namespace from a console path (`/k8s/ns/<ns>/...`)
pub fn namespace_from_path(path: &str) -> Option<&str> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    while let Some(segment) = segments.next() {
        if segment == "ns" {
            return segments.next().and_then(usable);
        }
    }

    None
}

fn usable(namespace: &str) -> Option<&str> {
    let namespace = namespace.trim();
    (!namespace.is_empty() && namespace != ALL_NAMESPACES).then_some(namespace)
}
