// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses and the database.

use crate::database::{Database, Role};
use crate::error::{Result, WatchtowerError};
use crate::kubernetes::ResourceApi;
use crate::types::AutomationController;
use async_trait::async_trait;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::{api::DynamicObject, Client, ResourceExt};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request received by [`MockService`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Value,
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PATCH requests matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Fall back to a prefix match
        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let bytes = req.into_body().collect().await?.to_bytes();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                content_type,
                body,
            });

            let (status, body) = response.unwrap_or_else(|| {
                // Default 404 for unmatched requests
                (404, status_json(404, "NotFound", "not found"))
            });

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a Kubernetes Status response body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

/// Discovery response advertising the AutomationController kind
pub fn api_resource_list_json() -> String {
    serde_json::json!({
        "kind": "APIResourceList",
        "apiVersion": "v1",
        "groupVersion": "automationcontroller.ansible.com/v1beta1",
        "resources": [{
            "name": "automationcontrollers",
            "singularName": "automationcontroller",
            "namespaced": true,
            "kind": "AutomationController",
            "verbs": ["get", "list", "watch", "patch", "update"]
        }]
    })
    .to_string()
}

/// An AutomationController object with an optional replicas annotation and spec field
pub fn controller_json(name: &str, annotation: Option<&str>, replicas: Option<Value>) -> Value {
    let mut metadata = serde_json::json!({ "name": name, "namespace": "aap" });
    if let Some(value) = annotation {
        metadata["annotations"] = serde_json::json!({ "watch-tower/replicas": value });
    }
    let mut spec = serde_json::json!({});
    if let Some(replicas) = replicas {
        spec["replicas"] = replicas;
    }

    serde_json::json!({
        "apiVersion": "automationcontroller.ansible.com/v1beta1",
        "kind": "AutomationController",
        "metadata": metadata,
        "spec": spec
    })
}

/// An AutomationController with no `spec` at all
pub fn bare_controller_json(name: &str, annotation: Option<&str>) -> Value {
    let mut controller = controller_json(name, annotation, None);
    if let Some(object) = controller.as_object_mut() {
        object.remove("spec");
    }
    controller
}

pub fn controller_list_json(items: &[Value]) -> String {
    serde_json::json!({
        "apiVersion": "automationcontroller.ansible.com/v1beta1",
        "kind": "AutomationControllerList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

/// Typed counterpart of [`controller_json`]
pub fn make_controller(name: &str, annotation: Option<&str>, replicas: Option<i64>) -> AutomationController {
    serde_json::from_value(controller_json(name, annotation, replicas.map(Value::from))).unwrap()
}

/// Typed counterpart of [`bare_controller_json`], built the way the cluster listing builds it
pub fn make_bare_controller(name: &str, annotation: Option<&str>) -> AutomationController {
    let object: DynamicObject =
        serde_json::from_value(bare_controller_json(name, annotation)).unwrap();
    AutomationController::from(object)
}

/// How the fake database behaves on each call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBehaviour {
    Unreachable,
    ConnectFails,
    RoleCheckFails,
    Healthy(Role),
}

/// In-memory [`Database`] that counts connections handed out and released.
#[derive(Clone)]
pub struct FakeDatabase {
    behaviour: Arc<Mutex<DbBehaviour>>,
    connects: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

pub struct FakeConnection;

impl FakeDatabase {
    pub fn new(behaviour: DbBehaviour) -> Self {
        Self {
            behaviour: Arc::new(Mutex::new(behaviour)),
            connects: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_behaviour(&self, behaviour: DbBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    /// Connect attempts, successful or not
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    fn behaviour(&self) -> DbBehaviour {
        *self.behaviour.lock().unwrap()
    }
}

#[async_trait]
impl Database for FakeDatabase {
    type Connection = FakeConnection;

    async fn probe(&self) -> Result<()> {
        match self.behaviour() {
            DbBehaviour::Unreachable => Err(WatchtowerError::Unreachable {
                address: "db:5432".to_string(),
                reason: "connection refused".to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn connect(&self) -> Result<FakeConnection> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.behaviour() {
            DbBehaviour::Unreachable | DbBehaviour::ConnectFails => Err(
                WatchtowerError::Connection("password authentication failed".to_string()),
            ),
            _ => Ok(FakeConnection),
        }
    }

    async fn check_role(&self, _conn: &mut FakeConnection) -> Result<Role> {
        match self.behaviour() {
            DbBehaviour::Healthy(role) => Ok(role),
            _ => Err(WatchtowerError::RoleCheck("connection reset".to_string())),
        }
    }

    async fn release(&self, _conn: FakeConnection) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory [`ResourceApi`] that applies patches to its stored controllers.
#[derive(Clone, Default)]
pub struct FakeResources {
    controllers: Arc<Mutex<Vec<AutomationController>>>,
    fail_list: Arc<Mutex<bool>>,
    fail_patch: Arc<Mutex<HashSet<String>>>,
    lists: Arc<AtomicUsize>,
    patches: Arc<Mutex<Vec<(String, u32)>>>,
}

impl FakeResources {
    pub fn new(controllers: Vec<AutomationController>) -> Self {
        Self {
            controllers: Arc::new(Mutex::new(controllers)),
            ..Default::default()
        }
    }

    pub fn fail_list(&self, fail: bool) {
        *self.fail_list.lock().unwrap() = fail;
    }

    pub fn fail_patch_for(&self, name: &str) {
        self.fail_patch.lock().unwrap().insert(name.to_string());
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    /// Every patch issued so far as `(name, replicas)`
    pub fn patches(&self) -> Vec<(String, u32)> {
        self.patches.lock().unwrap().clone()
    }

    pub fn observed(&self, name: &str) -> Option<i64> {
        self.controllers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name_any() == name)
            .and_then(|c| c.observed_replicas().ok())
    }
}

#[async_trait]
impl ResourceApi for FakeResources {
    async fn list(&self) -> Result<Vec<AutomationController>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if *self.fail_list.lock().unwrap() {
            return Err(WatchtowerError::List(kube::Error::Api(
                kube::core::ErrorResponse {
                    status: "Failure".to_string(),
                    message: "connection refused".to_string(),
                    reason: "ServiceUnavailable".to_string(),
                    code: 503,
                },
            )));
        }
        Ok(self.controllers.lock().unwrap().clone())
    }

    async fn patch_replicas(&self, name: &str, replicas: u32) -> Result<()> {
        self.patches
            .lock()
            .unwrap()
            .push((name.to_string(), replicas));

        if self.fail_patch.lock().unwrap().contains(name) {
            return Err(WatchtowerError::Patch {
                name: name.to_string(),
                source: kube::Error::Api(kube::core::ErrorResponse {
                    status: "Failure".to_string(),
                    message: "conflict".to_string(),
                    reason: "Conflict".to_string(),
                    code: 409,
                }),
            });
        }

        let mut controllers = self.controllers.lock().unwrap();
        if let Some(controller) = controllers.iter_mut().find(|c| c.name_any() == name) {
            controller.spec.replicas = Some(Value::from(replicas));
        }
        Ok(())
    }
}
