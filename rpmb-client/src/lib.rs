//! RPM Builder cluster client
//!
//! A small, type-safe client for the Kubernetes API, covering exactly what
//! the RPM builder needs: creating, reading, listing and updating namespaced
//! documents, and fetching pod logs.
//!
//! Writes go through a [`CreateChain`]: a direct, discovery-checked request
//! first, then a CSRF-protected request through a console proxy that probes
//! several base paths.
//!
//! # Example
//!
//! ```no_run
//! use rpmb_client::{ClusterClient, Resources};
//! use rpmb_core::dto::PipelineRun;
//!
//! # async fn example() -> rpmb_client::Result<()> {
//! let client = ClusterClient::new("https://api.cluster.local:6443")
//!     .with_token(Some("sha256~token".to_string()));
//!
//! let runs = Resources::<PipelineRun>::namespaced(&client, "builds");
//! for run in runs.list(Some("rpm-builder.io/build-id")).await? {
//!     println!("{}", run.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod csrf;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod strategy;
pub mod transport;

// Re-export commonly used types
pub use csrf::CsrfResolver;
pub use error::{ClientError, Result};
pub use gateway::{ClusterGateway, Resources};
pub use strategy::{ApiCreate, CreateChain, CreateStrategy, ProxyCreate};
pub use transport::Transport;

use async_trait::async_trait;
use reqwest::{Client, Method};
use rpmb_core::dto::{ObjectList, Pod, ResourceKind};
use serde_json::Value;
use std::sync::Arc;

use crate::discovery::Discovery;

/// Base paths the proxy strategy tries when none are configured
pub const DEFAULT_FALLBACK_BASE_PATHS: &[&str] = &["/api/kubernetes", ""];

/// HTTP client for the Kubernetes API
#[derive(Debug, Clone)]
pub struct ClusterClient {
    transport: Transport,
    discovery: Arc<Discovery>,
    fallback_base_paths: Vec<String>,
    csrf_metadata: Option<String>,
    create_chain: Arc<CreateChain>,
}

impl ClusterClient {
    /// Create a new client with the default fallback settings
    ///
    /// # Arguments
    /// * `base_url` - API server or console URL (e.g., "https://api.cluster.local:6443")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let client = Self {
            transport: Transport::new(base_url, client),
            discovery: Arc::new(Discovery::new()),
            fallback_base_paths: DEFAULT_FALLBACK_BASE_PATHS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            csrf_metadata: None,
            create_chain: Arc::new(CreateChain::default()),
        };
        client.rebuild_chain()
    }

    /// Authenticate with a bearer token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.transport = self.transport.with_bearer_token(token);
        self.rebuild_chain()
    }

    /// Send session cookies; the CSRF token is also looked up in them
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.transport = self.transport.with_cookie(cookie);
        self.rebuild_chain()
    }

    /// Configure the proxy fallback
    ///
    /// # Arguments
    /// * `base_paths` - Prefixes to probe in order
    /// * `csrf_metadata` - CSRF token published in session metadata, consulted
    ///   after the cookie and before the environment
    pub fn with_fallback(mut self, base_paths: Vec<String>, csrf_metadata: Option<String>) -> Self {
        self.fallback_base_paths = base_paths;
        self.csrf_metadata = csrf_metadata;
        self.rebuild_chain()
    }

    /// Replace the create strategies entirely
    ///
    /// Later calls to the other `with_*` methods restore the standard chain.
    pub fn with_create_chain(mut self, chain: CreateChain) -> Self {
        self.create_chain = Arc::new(chain);
        self
    }

    /// Direct request first, proxy fallback second
    fn rebuild_chain(mut self) -> Self {
        let csrf = CsrfResolver::standard(
            self.transport.cookie().map(str::to_string),
            self.csrf_metadata.clone(),
        );
        self.create_chain = Arc::new(CreateChain::new(vec![
            Box::new(ApiCreate::new(
                self.transport.clone(),
                Arc::clone(&self.discovery),
            )),
            Box::new(ProxyCreate::new(
                self.transport.clone(),
                self.fallback_base_paths.clone(),
                csrf,
            )),
        ]));
        self
    }

    /// Get the base URL of the API server
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

#[async_trait]
impl ClusterGateway for ClusterClient {
    async fn create(&self, kind: &ResourceKind, namespace: &str, body: Value) -> Result<Value> {
        self.create_chain.create(kind, namespace, &body).await
    }

    async fn get(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<Value> {
        let path = kind.item_path(namespace, name);
        let builder = self.transport.request(Method::GET, &path);

        self.transport.send_json(builder).await
    }

    async fn list(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Value>> {
        let path = kind.collection_path(namespace);
        let mut builder = self.transport.request(Method::GET, &path);
        if let Some(selector) = label_selector {
            builder = builder.query(&[("labelSelector", selector)]);
        }

        let list: ObjectList<Value> = self.transport.send_json(builder).await?;
        Ok(list.items)
    }

    async fn update(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
        body: Value,
    ) -> Result<Value> {
        let path = kind.item_path(namespace, name);
        let builder = self.transport.request(Method::PUT, &path);

        self.transport.send_document(builder, &body).await
    }

    async fn logs(&self, namespace: &str, pod: &str, container: Option<&str>) -> Result<String> {
        let path = format!("{}/log", Pod::KIND.item_path(namespace, pod));
        let mut builder = self.transport.request(Method::GET, &path);
        if let Some(container) = container {
            builder = builder.query(&[("container", container)]);
        }

        self.transport.send_text(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_creation() {
        let client = ClusterClient::new("https://api.cluster.local:6443");
        assert_eq!(client.base_url(), "https://api.cluster.local:6443");
        assert_eq!(client.create_chain.len(), 2);
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ClusterClient::new("https://api.cluster.local:6443/");
        assert_eq!(client.base_url(), "https://api.cluster.local:6443");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        let client = ClusterClient::with_client("http://localhost:8001", http_client)
            .with_token(Some("token".to_string()))
            .with_fallback(vec!["/api/kubernetes".to_string()], None);
        assert_eq!(client.base_url(), "http://localhost:8001");
        assert_eq!(client.create_chain.len(), 2);
    }

    #[test]
    fn test_client_with_custom_chain() {
        let client =
            ClusterClient::new("http://localhost:8001").with_create_chain(CreateChain::default());
        assert!(client.create_chain.is_empty());
    }
}
