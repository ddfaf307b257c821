//! Configuration module
//!
//! Global flags shared by every command. Each one can also be set through the
//! environment variable the orchestrator library reads.

use clap::Args;
use rpmb_orchestrator::Config;
use rpmb_orchestrator::config::{DEFAULT_API_SERVER, DEFAULT_PIPELINE_NAME};
use std::time::Duration;

/// Connection and build settings
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// API server or console URL
    #[arg(long, global = true, env = "RPMB_API_SERVER", default_value = DEFAULT_API_SERVER)]
    pub api_server: String,

    /// Bearer token for the API server
    #[arg(long, global = true, env = "RPMB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Namespace to work in (overrides the console location and the default)
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Namespace used when no other source names one
    #[arg(long, global = true, env = "RPMB_NAMESPACE")]
    pub default_namespace: Option<String>,

    /// Console location the namespace can be read from (e.g. /k8s/ns/builds)
    #[arg(long, global = true, env = "RPMB_CONSOLE_PATH")]
    pub console_path: Option<String>,

    /// Tekton pipeline every build runs
    #[arg(long, global = true, env = "RPMB_PIPELINE", default_value = DEFAULT_PIPELINE_NAME)]
    pub pipeline: String,

    /// Seconds between status polls
    #[arg(long, global = true, env = "RPMB_POLL_INTERVAL", default_value_t = 5)]
    pub poll_interval: u64,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "RPMB_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    /// Proxy base paths tried when a direct create fails (comma-separated)
    #[arg(
        long,
        global = true,
        env = "RPMB_FALLBACK_BASE_PATHS",
        value_delimiter = ','
    )]
    pub fallback_base_path: Vec<String>,

    /// Session cookies for a console proxy
    #[arg(long, global = true, env = "RPMB_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// CSRF token from the console session metadata
    #[arg(long, global = true, env = "RPMB_CSRF_META", hide_env_values = true)]
    pub csrf_meta: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true, env = "RPMB_INSECURE")]
    pub insecure: bool,
}

impl GlobalArgs {
    /// Orchestrator configuration described by the flags
    pub fn to_config(&self) -> Config {
        let mut config = Config::new(self.api_server.clone());

        config.token = self.token.clone();
        config.default_namespace = self.default_namespace.clone();
        config.console_path = self.console_path.clone();
        config.pipeline_name = self.pipeline.clone();
        config.poll_interval = Duration::from_secs(self.poll_interval);
        config.request_timeout = Duration::from_secs(self.request_timeout);
        if !self.fallback_base_path.is_empty() {
            config.fallback_base_paths = self
                .fallback_base_path
                .iter()
                .map(|p| p.trim().to_string())
                .collect();
        }
        config.cookie = self.cookie.clone();
        config.csrf_meta = self.csrf_meta.clone();
        config.accept_invalid_certs = self.insecure;

        config
    }
}
