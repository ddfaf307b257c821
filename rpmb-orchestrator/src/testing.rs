//! In-memory cluster gateway for tests

use async_trait::async_trait;
use rpmb_client::{ClientError, ClusterGateway, Result};
use rpmb_core::dto::{Pod, ResourceKind};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// A gateway call as recorded by [`FakeGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { plural: String, name: String },
    Get { plural: String, name: String },
    List { plural: String, selector: Option<String> },
    Update { plural: String, name: String },
    Logs { pod: String, container: Option<String> },
}

impl Call {
    pub fn is_create(&self) -> bool {
        matches!(self, Call::Create { .. })
    }
}

type Key = (String, String, String);

#[derive(Default)]
struct State {
    objects: BTreeMap<Key, Value>,
    calls: Vec<Call>,
    failing_creates: HashSet<String>,
    failing_gets: usize,
    statuses: VecDeque<Value>,
    logs: HashMap<(String, String), String>,
    version: u64,
}

/// Stores objects in memory and records every call
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<State>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn creates(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_create).collect()
    }

    /// Every create of this resource plural fails with 403
    pub fn fail_creates_of(&self, plural: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_creates
            .insert(plural.to_string());
    }

    /// The next `count` gets fail with 503
    pub fn fail_next_gets(&self, count: usize) {
        self.state.lock().unwrap().failing_gets = count;
    }

    /// Status blocks applied to pipeline runs, one per get; `Value::Null`
    /// removes the status
    pub fn script_statuses(&self, statuses: Vec<Value>) {
        self.state.lock().unwrap().statuses = statuses.into();
    }

    pub fn insert(&self, kind: &ResourceKind, namespace: &str, object: Value) {
        let name = name_of(&object);
        self.state.lock().unwrap().objects.insert(
            (kind.plural.to_string(), namespace.to_string(), name),
            object,
        );
    }

    pub fn object(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&key(kind, namespace, name))
            .cloned()
    }

    /// Adds a pod spawned for `pipeline_run` with one log text per container
    pub fn add_pod(&self, namespace: &str, name: &str, pipeline_run: &str, logs: &[(&str, &str)]) {
        let containers: Vec<Value> = logs.iter().map(|(c, _)| json!({"name": c})).collect();
        self.insert(
            &Pod::KIND,
            namespace,
            json!({
                "metadata": {
                    "name": name,
                    "namespace": namespace,
                    "labels": {"tekton.dev/pipelineRun": pipeline_run}
                },
                "spec": {"containers": containers}
            }),
        );

        let mut state = self.state.lock().unwrap();
        for (container, text) in logs {
            state
                .logs
                .insert((name.to_string(), container.to_string()), text.to_string());
        }
    }
}

#[async_trait]
impl ClusterGateway for FakeGateway {
    async fn create(&self, kind: &ResourceKind, namespace: &str, mut body: Value) -> Result<Value> {
        let name = name_of(&body);
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create {
            plural: kind.plural.to_string(),
            name: name.clone(),
        });

        if state.failing_creates.contains(kind.plural) {
            return Err(ClientError::api_error(403, format!("{} is forbidden", kind.plural)));
        }

        let key = key(kind, namespace, &name);
        if state.objects.contains_key(&key) {
            return Err(ClientError::api_error(409, format!("{} already exists", name)));
        }

        state.version += 1;
        body["metadata"]["resourceVersion"] = json!(state.version.to_string());
        state.objects.insert(key, body.clone());
        Ok(body)
    }

    async fn get(&self, kind: &ResourceKind, namespace: &str, name: &str) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get {
            plural: kind.plural.to_string(),
            name: name.to_string(),
        });

        if state.failing_gets > 0 {
            state.failing_gets -= 1;
            return Err(ClientError::api_error(503, "service unavailable"));
        }

        let key = key(kind, namespace, name);
        if !state.objects.contains_key(&key) {
            return Err(ClientError::api_error(404, format!("{} not found", name)));
        }

        let scripted = if kind.plural == "pipelineruns" {
            state.statuses.pop_front()
        } else {
            None
        };

        let object = state
            .objects
            .get_mut(&key)
            .ok_or_else(|| ClientError::NotFound(name.to_string()))?;
        match scripted {
            Some(Value::Null) => {
                if let Some(map) = object.as_object_mut() {
                    map.remove("status");
                }
            }
            Some(status) => object["status"] = status,
            None => {}
        }

        Ok(object.clone())
    }

    async fn list(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Value>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List {
            plural: kind.plural.to_string(),
            selector: label_selector.map(str::to_string),
        });

        Ok(state
            .objects
            .iter()
            .filter(|((plural, ns, _), _)| plural == kind.plural && ns == namespace)
            .filter(|(_, object)| label_selector.is_none_or(|s| matches_selector(object, s)))
            .map(|(_, object)| object.clone())
            .collect())
    }

    async fn update(
        &self,
        kind: &ResourceKind,
        namespace: &str,
        name: &str,
        mut body: Value,
    ) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update {
            plural: kind.plural.to_string(),
            name: name.to_string(),
        });

        let key = key(kind, namespace, name);
        let Some(current) = state.objects.get(&key) else {
            return Err(ClientError::api_error(404, format!("{} not found", name)));
        };

        let sent = &body["metadata"]["resourceVersion"];
        if !sent.is_null() && *sent != current["metadata"]["resourceVersion"] {
            return Err(ClientError::api_error(409, "the object has been modified"));
        }

        state.version += 1;
        body["metadata"]["resourceVersion"] = json!(state.version.to_string());
        state.objects.insert(key, body.clone());
        Ok(body)
    }

    async fn logs(&self, _namespace: &str, pod: &str, container: Option<&str>) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Logs {
            pod: pod.to_string(),
            container: container.map(str::to_string),
        });

        state
            .logs
            .get(&(pod.to_string(), container.unwrap_or_default().to_string()))
            .cloned()
            .ok_or_else(|| ClientError::api_error(404, format!("no logs for {}", pod)))
    }
}

fn key(kind: &ResourceKind, namespace: &str, name: &str) -> Key {
    (
        kind.plural.to_string(),
        namespace.to_string(),
        name.to_string(),
    )
}

fn name_of(object: &Value) -> String {
    object["metadata"]["name"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

/// Supports `key` and `key=value` terms joined by commas
fn matches_selector(object: &Value, selector: &str) -> bool {
    let labels = &object["metadata"]["labels"];
    selector.split(',').all(|term| match term.split_once('=') {
        Some((k, v)) => labels[k.trim()].as_str() == Some(v.trim()),
        None => !labels[term.trim()].is_null(),
    })
}
