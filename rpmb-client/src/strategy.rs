//! Create strategies
//!
//! Creating a document can go through more than one path. The primary
//! strategy talks to the API server directly, after checking with discovery
//! that the resource type is served. The fallback goes through a console
//! proxy: it attaches a CSRF token and probes a list of candidate base paths,
//! stopping at the first one that does not answer "not found".
//!
//! [`CreateChain`] runs the strategies in order and returns the first success.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use rpmb_core::dto::ResourceKind;

use crate::csrf::{CSRF_HEADER, CsrfResolver};
use crate::discovery::Discovery;
use crate::error::{ClientError, Result};
use crate::transport::Transport;

/// One way of creating a document on the cluster
#[async_trait]
pub trait CreateStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs and aggregate errors
    fn name(&self) -> &'static str;

    /// Creates `body` in `namespace` and returns the stored object
    async fn create(&self, kind: &ResourceKind, namespace: &str, body: &Value) -> Result<Value>;
}

/// Primary strategy: discovery-checked POST to the API server
#[derive(Debug)]
pub struct ApiCreate {
    transport: Transport,
    discovery: Arc<Discovery>,
}

impl ApiCreate {
    pub fn new(transport: Transport, discovery: Arc<Discovery>) -> Self {
        Self {
            transport,
            discovery,
        }
    }
}

#[async_trait]
impl CreateStrategy for ApiCreate {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn create(&self, kind: &ResourceKind, namespace: &str, body: &Value) -> Result<Value> {
        self.discovery.ensure_served(&self.transport, kind).await?;

        let path = kind.collection_path(namespace);
        let builder = self.transport.request(Method::POST, &path);
        self.transport.send_document(builder, body).await
    }
}

/// Fallback strategy: CSRF-protected POST through a proxy prefix
#[derive(Debug)]
pub struct ProxyCreate {
    transport: Transport,
    base_paths: Vec<String>,
    csrf: CsrfResolver,
}

impl ProxyCreate {
    /// # Arguments
    /// * `transport` - Transport to the console or API server
    /// * `base_paths` - Prefixes to try in order (`/api/kubernetes`, `` for none)
    /// * `csrf` - Where to look for the CSRF token
    pub fn new(transport: Transport, base_paths: Vec<String>, csrf: CsrfResolver) -> Self {
        let base_paths = base_paths
            .into_iter()
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .collect();
        Self {
            transport,
            base_paths,
            csrf,
        }
    }
}

#[async_trait]
impl CreateStrategy for ProxyCreate {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn create(&self, kind: &ResourceKind, namespace: &str, body: &Value) -> Result<Value> {
        let token = self.csrf.resolve();
        if token.is_none() {
            debug!("No CSRF token available, sending request without one");
        }

        let collection = kind.collection_path(namespace);
        probe_base_paths(&collection, &self.base_paths, |base| {
            let path = format!("{}{}", base, collection);
            let mut builder = self.transport.request(Method::POST, &path);
            if let Some(token) = &token {
                builder = builder.header(CSRF_HEADER, token);
            }
            async move { self.transport.send_document(builder, body).await }
        })
        .await
    }
}

/// Tries `attempt` against each base path until one answers other than 404
///
/// Success and any non-404 failure end the probe. When every candidate
/// answers 404 the endpoint is missing and `EndpointNotFound` is returned;
/// the caller must not retry.
pub async fn probe_base_paths<T, F, Fut>(
    resource: &str,
    candidates: &[String],
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut tried = Vec::with_capacity(candidates.len());

    for base in candidates {
        match attempt(base).await {
            Err(e) if e.is_not_found() => {
                debug!(base = %base, "Base path answered not found, trying next");
                tried.push(if base.is_empty() {
                    "/".to_string()
                } else {
                    base.clone()
                });
            }
            outcome => return outcome,
        }
    }

    Err(ClientError::EndpointNotFound {
        resource: resource.to_string(),
        tried,
    })
}

/// Ordered list of create strategies
#[derive(Debug, Default)]
pub struct CreateChain {
    strategies: Vec<Box<dyn CreateStrategy>>,
}

impl CreateChain {
    pub fn new(strategies: Vec<Box<dyn CreateStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Runs each strategy in order and returns the first success
    ///
    /// When all of them fail the error lists every attempt so the original
    /// cause is never lost.
    pub async fn create(&self, kind: &ResourceKind, namespace: &str, body: &Value) -> Result<Value> {
        if self.strategies.is_empty() {
            return Err(ClientError::InvalidRequest(
                "no create strategy configured".to_string(),
            ));
        }

        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match strategy.create(kind, namespace, body).await {
                Ok(created) => {
                    if !attempts.is_empty() {
                        debug!(
                            strategy = strategy.name(),
                            "Created {} after {} failed attempt(s)",
                            kind.kind,
                            attempts.len()
                        );
                    }
                    return Ok(created);
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        error = %e,
                        "Failed to create {} in {}",
                        kind.kind,
                        namespace
                    );
                    attempts.push(format!("{}: {}", strategy.name(), e));
                }
            }
        }

        Err(ClientError::StrategiesExhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const CONFIG_MAPS: ResourceKind = ResourceKind::new("", "v1", "ConfigMap", "configmaps");

    /// Strategy answering from a fixed script
    #[derive(Debug)]
    struct Scripted {
        name: &'static str,
        outcome: fn() -> Result<Value>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(name: &'static str, outcome: fn() -> Result<Value>) -> Self {
            Self {
                name,
                outcome,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CreateStrategy for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn create(&self, _: &ResourceKind, _: &str, _: &Value) -> Result<Value> {
            *self.calls.lock().unwrap() += 1;
            (self.outcome)()
        }
    }

    fn ok() -> Result<Value> {
        Ok(serde_json::json!({"metadata": {"name": "created"}}))
    }

    fn forbidden() -> Result<Value> {
        Err(ClientError::api_error(403, "forbidden"))
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_success() {
        let chain = CreateChain::new(vec![
            Box::new(Scripted::new("api", ok)),
            Box::new(Scripted::new("proxy", forbidden)),
        ]);

        let created = chain
            .create(&CONFIG_MAPS, "builds", &Value::Null)
            .await
            .unwrap();
        assert_eq!(created["metadata"]["name"], "created");
    }

    #[tokio::test]
    async fn test_chain_falls_back_on_failure() {
        let chain = CreateChain::new(vec![
            Box::new(Scripted::new("api", forbidden)),
            Box::new(Scripted::new("proxy", ok)),
        ]);

        assert!(chain.create(&CONFIG_MAPS, "builds", &Value::Null).await.is_ok());
    }

    #[tokio::test]
    async fn test_chain_reports_every_attempt() {
        let chain = CreateChain::new(vec![
            Box::new(Scripted::new("api", forbidden)),
            Box::new(Scripted::new("proxy", forbidden)),
        ]);

        let err = chain
            .create(&CONFIG_MAPS, "builds", &Value::Null)
            .await
            .unwrap_err();
        match err {
            ClientError::StrategiesExhausted { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].starts_with("api:"));
                assert!(attempts[1].starts_with("proxy:"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_chain_is_invalid() {
        let err = CreateChain::default()
            .create(&CONFIG_MAPS, "builds", &Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_probe_stops_at_first_non_not_found() {
        let candidates = vec!["/api/kubernetes".to_string(), String::new()];
        let mut seen = Vec::new();

        let result: Result<()> = probe_base_paths("/api/v1/namespaces/b/configmaps", &candidates, |base| {
            seen.push(base.to_string());
            let outcome = if base.is_empty() {
                Err(ClientError::api_error(409, "already exists"))
            } else {
                Err(ClientError::api_error(404, "not found"))
            };
            async move { outcome }
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ClientError::ApiError { status: 409, .. }));
        assert_eq!(seen, vec!["/api/kubernetes".to_string(), String::new()]);
    }

    #[tokio::test]
    async fn test_probe_returns_first_success() {
        let candidates = vec!["/api/kubernetes".to_string(), String::new()];
        let mut calls = 0;

        let result = probe_base_paths("/apis/tekton.dev/v1beta1", &candidates, |base| {
            calls += 1;
            let outcome = Ok(base.to_string());
            async move { outcome }
        })
        .await;

        assert_eq!(result.unwrap(), "/api/kubernetes");
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_probe_all_not_found_is_definitive() {
        let candidates = vec!["/api/kubernetes".to_string(), String::new()];

        let result: Result<()> = probe_base_paths("/apis/tekton.dev/v1beta1", &candidates, |_| {
            async { Err(ClientError::api_error(404, "not found")) }
        })
        .await;

        match result.unwrap_err() {
            ClientError::EndpointNotFound { resource, tried } => {
                assert_eq!(resource, "/apis/tekton.dev/v1beta1");
                assert_eq!(tried, vec!["/api/kubernetes".to_string(), "/".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_proxy_normalizes_base_paths() {
        let transport = Transport::new("http://localhost:9000", reqwest::Client::new());
        let proxy = ProxyCreate::new(
            transport,
            vec!["/api/kubernetes/".to_string(), " ".to_string()],
            CsrfResolver::default(),
        );
        assert_eq!(proxy.base_paths, vec!["/api/kubernetes".to_string(), String::new()]);
    }
}
