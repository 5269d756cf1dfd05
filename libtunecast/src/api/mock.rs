//! Mock API client for testing
//!
//! Routes are keyed by method and path and answer the same way every time
//! until replaced. Every request is recorded so tests can assert on query
//! parameters and bodies. Unrouted requests fail with
//! [`ApiError::NoRoute`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::sleep;

use super::{ApiClient, ApiRequest, Method};
use crate::error::ApiError;

#[derive(Debug, Clone)]
enum Reply {
    Data(Value),
    Rejected(String),
    Status(u16, Option<String>),
}

#[derive(Debug, Clone)]
struct Route {
    reply: Reply,
    delay: Duration,
}

#[derive(Default)]
pub struct MockApiClient {
    routes: Mutex<HashMap<(Method, String), Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&self, method: Method, path: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        let delay = routes
            .get(&(method, path.to_string()))
            .map(|r| r.delay)
            .unwrap_or_default();
        routes.insert((method, path.to_string()), Route { reply, delay });
    }

    /// Answer with `{ result: true, data }`
    pub fn respond(&self, method: Method, path: &str, data: Value) {
        self.route(method, path, Reply::Data(data));
    }

    /// Answer with `{ result: false, message }`
    pub fn reject(&self, method: Method, path: &str, message: &str) {
        self.route(method, path, Reply::Rejected(message.to_string()));
    }

    /// Answer with a non-2xx status
    pub fn fail(&self, method: Method, path: &str, status: u16, message: Option<&str>) {
        self.route(
            method,
            path,
            Reply::Status(status, message.map(str::to_string)),
        );
    }

    /// Hold the answer for `delay` before replying. Applies to the current
    /// and later replies on this route.
    pub fn delay(&self, method: Method, path: &str, delay: Duration) {
        let mut routes = self.routes.lock().unwrap();
        routes
            .entry((method, path.to_string()))
            .or_insert(Route {
                reply: Reply::Data(Value::Null),
                delay,
            })
            .delay = delay;
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests received for one method and path
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let route = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method, request.path.clone()))
            .cloned();
        let (method, path) = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);

        let route = route.ok_or_else(|| ApiError::NoRoute {
            method: method.to_string(),
            path,
        })?;

        if !route.delay.is_zero() {
            sleep(route.delay).await;
        }

        match route.reply {
            Reply::Data(data) => Ok(data),
            Reply::Rejected(message) => Err(ApiError::Rejected { message }),
            Reply::Status(401, message) => Err(ApiError::Unauthorized(
                message.unwrap_or_else(|| "unauthorized".to_string()),
            )),
            Reply::Status(status, message) => Err(ApiError::Status { status, message }),
        }
    }
}
