//! Cluster resource gateway
//!
//! [`ClusterGateway`] is the seam between the orchestration logic and the
//! cluster API. It works on untyped JSON documents so it stays object safe;
//! [`Resources`] layers typed access on top of any gateway.

use async_trait::async_trait;
use serde_json::Value;
use std::marker::PhantomData;

use rpmb_core::dto::{ClusterResource, ResourceKind};

use crate::error::Result;

/// Generic create/get/list/update access to namespaced resources
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// Creates a document and returns the stored object
    async fn create(&self, kind: &ResourceKind, namespace: &str, body: Value) -> Result<Value>;

    /// Fetches one object by name
    async fn get(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<Value>;

    /// Lists objects, optionally filtered by a label selector
    async fn list(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Value>>;

    /// Replaces an object; `body` must carry the current resource version
    async fn update(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
        body: Value,
    ) -> Result<Value>;

    /// Raw log text of one pod container
    async fn logs(&self, namespace: &str, pod: &str, container: Option<&str>) -> Result<String>;
}

/// Typed access to one resource kind in one namespace
pub struct Resources<'a, K> {
    gateway: &'a dyn ClusterGateway,
    namespace: &'a str,
    _kind: PhantomData<fn() -> K>,
}

impl<'a, K: ClusterResource> Resources<'a, K> {
    pub fn namespaced(gateway: &'a dyn ClusterGateway, namespace: &'a str) -> Self {
        Self {
            gateway,
            namespace,
            _kind: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub async fn create(&self, object: &K) -> Result<K> {
        let body = serde_json::to_value(object)?;
        let created = self.gateway.create(&K::KIND, self.namespace, body).await?;
        Ok(serde_json::from_value(created)?)
    }

    pub async fn get(&self, name: &str) -> Result<K> {
        let object = self.gateway.get(&K::KIND, self.namespace, name).await?;
        Ok(serde_json::from_value(object)?)
    }

    pub async fn list(&self, label_selector: Option<&str>) -> Result<Vec<K>> {
        let items = self
            .gateway
            .list(&K::KIND, self.namespace, label_selector)
            .await?;

        items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Into::into))
            .collect()
    }

    pub async fn update(&self, object: &K) -> Result<K> {
        let name = object.metadata().name.clone();
        let body = serde_json::to_value(object)?;
        let updated = self
            .gateway
            .update(&K::KIND, self.namespace, &name, body)
            .await?;
        Ok(serde_json::from_value(updated)?)
    }
}
