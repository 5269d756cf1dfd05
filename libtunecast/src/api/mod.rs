//! REST client abstraction
//!
//! Every backend call is an [`ApiRequest`] sent through an [`ApiClient`].
//! Responses arrive wrapped as `{ "result": bool, "data": ..., "message": ... }`;
//! clients unwrap the envelope and hand back `data`, turning a false
//! `result` into [`ApiError::Rejected`].
//!
//! List endpoints take a [`Query`]: `filters` is a JSON-encoded array of
//! `{ key, operator, value }`, plus optional `sortBy` and `limit`.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

pub mod endpoints;
pub mod http;
pub mod mock;

pub use endpoints::Api;
pub use http::HttpApiClient;
pub use mock::MockApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "not")]
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub key: String,
    pub operator: Operator,
    pub value: String,
}

impl Filter {
    pub fn eq(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            operator: Operator::Eq,
            value: value.into(),
        }
    }

    pub fn not(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            operator: Operator::Not,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters for list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub sort_by: Option<(String, SortOrder)>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_by = Some((field.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.sort_by.is_none() && self.limit.is_none()
    }

    /// Flatten into URL query pairs
    pub fn to_params(&self) -> Result<Vec<(String, String)>, ApiError> {
        let mut params = Vec::new();
        if !self.filters.is_empty() {
            params.push(("filters".to_string(), serde_json::to_string(&self.filters)?));
        }
        if let Some((field, order)) = &self.sort_by {
            let order = match order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            params.push(("sortBy".to_string(), format!("{field}:{order}")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        Ok(params)
    }
}

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        path: PathBuf,
        mime: String,
    },
}

impl Part {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        Part::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn file(name: &str, path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Part::File {
            name: name.to_string(),
            path: path.into(),
            mime: mime.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Part::Text { name, .. } | Part::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<Part>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`
    pub path: String,
    pub query: Query,
    pub body: Body,
    /// Extra headers; the bearer token is added by the client
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Query::default(),
            body: Body::Empty,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(Body::Json(body))
    }

    pub fn put_multipart(path: impl Into<String>, parts: Vec<Part>) -> Self {
        Self::new(Method::Put, path).with_body(Body::Multipart(parts))
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Send the request and return the envelope's `data`
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;
}
