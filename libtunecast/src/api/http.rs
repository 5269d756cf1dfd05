//! reqwest-backed [`ApiClient`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part as FormPart};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{ApiClient, ApiRequest, Body, Method, Part};
use crate::config::ApiConfig;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: Option<String>,
}

pub struct HttpApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn form(parts: Vec<Part>) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for part in parts {
            form = match part {
                Part::Text { name, value } => form.text(name, value),
                Part::File { name, path, mime } => {
                    let bytes = tokio::fs::read(&path).await.map_err(|e| {
                        ApiError::Http(format!("Failed to read {}: {e}", path.display()))
                    })?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| name.clone());
                    let file = FormPart::bytes(bytes).file_name(file_name).mime_str(&mime)?;
                    form.part(name, file)
                }
            };
        }
        Ok(form)
    }
}

fn method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Unwrap a response body into `data`, mapping failures onto [`ApiError`]
pub(crate) fn unwrap_envelope(status: u16, body: &str) -> Result<Value, ApiError> {
    let envelope: Option<Envelope> = serde_json::from_str(body).ok();
    let message = envelope.as_ref().and_then(|e| e.message.clone());

    if status == StatusCode::UNAUTHORIZED.as_u16() {
        return Err(ApiError::Unauthorized(
            message.unwrap_or_else(|| "missing or expired token".to_string()),
        ));
    }
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, message });
    }

    let envelope =
        envelope.ok_or_else(|| ApiError::Decode(format!("not a response envelope: {body}")))?;
    if !envelope.result {
        return Err(ApiError::Rejected {
            message: message.unwrap_or_else(|| "request was not accepted".to_string()),
        });
    }
    Ok(envelope.data)
}

#[async_trait]
impl ApiClient for HttpApiClient {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let params = request.query.to_params()?;
        let mut builder = self
            .client
            .request(method(request.method), self.url(&request.path));

        if !params.is_empty() {
            builder = builder.query(&params);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(parts) => builder.multipart(Self::form(parts).await?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "response received");

        unwrap_envelope(status, &body)
    }
}
