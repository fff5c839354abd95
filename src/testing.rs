//! In-memory API backend for tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::api::{ApiClient, ApiRequest, ApiResponse, Method, Transport};
use crate::error::ApiResult;

type Handler = Arc<dyn Fn(&ApiRequest) -> ApiResult<ApiResponse> + Send + Sync>;

/// Routes requests by method and path; a `*` segment matches any one
/// segment. Unknown routes answer 404.
#[derive(Default)]
pub struct FakeBackend {
    routes: Mutex<Vec<(Method, String, Handler)>>,
    requests: Mutex<Vec<ApiRequest>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn client(self: &Arc<Self>) -> ApiClient {
        ApiClient::new(self.clone())
    }

    /// Register a handler; later registrations win
    pub fn on(
        &self,
        method: Method,
        path: &str,
        handler: impl Fn(&ApiRequest) -> ApiResult<ApiResponse> + Send + Sync + 'static,
    ) {
        self.routes
            .lock()
            .unwrap()
            .push((method, path.to_string(), Arc::new(handler)));
    }

    pub fn on_json(&self, method: Method, path: &str, body: Value) {
        self.on(method, path, move |_| Ok(ApiResponse::json(200, &body)));
    }

    /// Hold requests to `path` until permits are added to the returned gate
    pub fn hold(&self, path: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let gate = self.gates.lock().unwrap().get(&request.path).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        let handler = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(method, pattern, _)| *method == request.method && matches_path(pattern, &request.path))
            .map(|(_, _, handler)| handler.clone());

        match handler {
            Some(handler) => handler(&request),
            None => Ok(ApiResponse::json(
                404,
                &json!({"status": "Error", "error": format!("no route for {}", request.path)}),
            )),
        }
    }
}

fn matches_path(pattern: &str, path: &str) -> bool {
    let mut pattern = pattern.split('/');
    let mut path = path.split('/');
    loop {
        match (pattern.next(), path.next()) {
            (None, None) => return true,
            (Some("*"), Some(_)) => {}
            (Some(a), Some(b)) if a == b => {}
            _ => return false,
        }
    }
}
