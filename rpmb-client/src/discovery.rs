//! API discovery
//!
//! Before writing through the primary path the client checks that the API
//! server actually serves the resource type. Tekton moved from `v1beta1` to
//! `v1` and clusters differ in what they install; asking first turns a
//! confusing 404 on the write into a clear `Unsupported` error and lets the
//! fallback strategy take over.

use reqwest::Method;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use rpmb_core::dto::ResourceKind;

use crate::error::{ClientError, Result};
use crate::transport::Transport;

/// Cache of served resource plurals, keyed by group-version path
#[derive(Debug, Default)]
pub struct Discovery {
    served: RwLock<HashMap<String, HashSet<String>>>,
}

#[derive(Debug, Deserialize)]
struct ApiResourceList {
    #[serde(default)]
    resources: Vec<ApiResource>,
}

#[derive(Debug, Deserialize)]
struct ApiResource {
    name: String,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `Unsupported` if `kind` is not served
    ///
    /// The group version is fetched once and cached for the lifetime of the
    /// client.
    pub async fn ensure_served(&self, transport: &Transport, kind: &ResourceKind) -> Result<()> {
        let path = kind.group_version_path();

        let cached = self.lookup(&path, kind.plural);
        let served = match cached {
            Some(served) => served,
            None => {
                let list: ApiResourceList = transport
                    .send_json(transport.request(Method::GET, &path))
                    .await?;
                let plurals: HashSet<String> = list
                    .resources
                    .into_iter()
                    // Subresources (`pipelineruns/status`) are listed too
                    .filter(|r| !r.name.contains('/'))
                    .map(|r| r.name)
                    .collect();
                let served = plurals.contains(kind.plural);
                self.remember(path.clone(), plurals);
                served
            }
        };

        if served {
            Ok(())
        } else {
            Err(ClientError::Unsupported(format!(
                "{} ({})",
                kind.plural,
                kind.api_version()
            )))
        }
    }

    fn lookup(&self, path: &str, plural: &str) -> Option<bool> {
        let served = self.served.read().unwrap_or_else(|e| e.into_inner());
        served.get(path).map(|plurals| plurals.contains(plural))
    }

    fn remember(&self, path: String, plurals: HashSet<String>) {
        let mut served = self.served.write().unwrap_or_else(|e| e.into_inner());
        served.insert(path, plurals);
    }
}
