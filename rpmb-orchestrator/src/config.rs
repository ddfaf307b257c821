//! Orchestrator configuration
//!
//! Defines every tunable of the orchestrator: how to reach the cluster, where
//! builds go by default, which pipeline template runs them and how often a
//! running build is polled.

use reqwest::Client;
use rpmb_client::{ClusterClient, DEFAULT_FALLBACK_BASE_PATHS};
use std::time::Duration;

/// Pipeline template every build runs
pub const DEFAULT_PIPELINE_NAME: &str = "rpm-build-pipeline";

/// In-cluster API server address
pub const DEFAULT_API_SERVER: &str = "https://kubernetes.default.svc";

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server or console URL
    pub api_server: String,

    /// Bearer token for the API server
    pub token: Option<String>,

    /// Namespace used when neither the caller nor the console context names one
    pub default_namespace: Option<String>,

    /// Console location the user is looking at (e.g. `/k8s/ns/builds/...`)
    pub console_path: Option<String>,

    /// Name of the Tekton pipeline template
    pub pipeline_name: String,

    /// How often a running build is polled
    pub poll_interval: Duration,

    /// Timeout of a single API request
    pub request_timeout: Duration,

    /// Base paths probed by the proxy fallback, in order
    pub fallback_base_paths: Vec<String>,

    /// Session cookies forwarded to a console proxy
    pub cookie: Option<String>,

    /// CSRF token published in session metadata
    pub csrf_meta: Option<String>,

    /// Skip TLS verification (development clusters only)
    pub accept_invalid_certs: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(api_server: String) -> Self {
        Self {
            api_server,
            token: None,
            default_namespace: None,
            console_path: None,
            pipeline_name: DEFAULT_PIPELINE_NAME.to_string(),
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            fallback_base_paths: DEFAULT_FALLBACK_BASE_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cookie: None,
            csrf_meta: None,
            accept_invalid_certs: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - RPMB_API_SERVER (default: in-cluster API server)
    /// - RPMB_TOKEN
    /// - RPMB_NAMESPACE
    /// - RPMB_CONSOLE_PATH
    /// - RPMB_PIPELINE (default: rpm-build-pipeline)
    /// - RPMB_POLL_INTERVAL (seconds, default: 5)
    /// - RPMB_REQUEST_TIMEOUT (seconds, default: 30)
    /// - RPMB_FALLBACK_BASE_PATHS (comma separated, default: /api/kubernetes,)
    /// - RPMB_COOKIE
    /// - RPMB_CSRF_META
    /// - RPMB_INSECURE (true/false, default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let seconds = |key: &str| {
            non_empty(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        let mut config =
            Self::new(non_empty("RPMB_API_SERVER").unwrap_or_else(|| DEFAULT_API_SERVER.to_string()));

        config.token = non_empty("RPMB_TOKEN");
        config.default_namespace = non_empty("RPMB_NAMESPACE");
        config.console_path = non_empty("RPMB_CONSOLE_PATH");
        config.cookie = non_empty("RPMB_COOKIE");
        config.csrf_meta = non_empty("RPMB_CSRF_META");

        if let Some(pipeline) = non_empty("RPMB_PIPELINE") {
            config.pipeline_name = pipeline;
        }
        if let Some(interval) = seconds("RPMB_POLL_INTERVAL") {
            config.poll_interval = interval;
        }
        if let Some(timeout) = seconds("RPMB_REQUEST_TIMEOUT") {
            config.request_timeout = timeout;
        }
        // An empty entry means "no prefix", so the raw value is split as is
        if let Some(paths) = lookup("RPMB_FALLBACK_BASE_PATHS") {
            config.fallback_base_paths = paths.split(',').map(|p| p.trim().to_string()).collect();
        }
        if let Some(insecure) = non_empty("RPMB_INSECURE") {
            config.accept_invalid_certs = matches!(
                insecure.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        config
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_server.is_empty() {
            anyhow::bail!("api_server cannot be empty");
        }

        if !self.api_server.starts_with("http://") && !self.api_server.starts_with("https://") {
            anyhow::bail!("api_server must start with http:// or https://");
        }

        if self.pipeline_name.trim().is_empty() {
            anyhow::bail!("pipeline_name cannot be empty");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }

    /// Builds the cluster client described by this configuration
    pub fn cluster_client(&self) -> anyhow::Result<ClusterClient> {
        let http_client = Client::builder()
            .timeout(self.request_timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;

        Ok(
            ClusterClient::with_client(self.api_server.clone(), http_client)
                .with_token(self.token.clone())
                .with_cookie(self.cookie.clone())
                .with_fallback(self.fallback_base_paths.clone(), self.csrf_meta.clone()),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_SERVER.to_string())
    }
}
