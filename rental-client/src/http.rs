//! HTTP transport for the rental backend
//!
//! The transport hands back every HTTP status as an [`ApiReply`]; only
//! timeouts and connection failures are errors at this level. Status
//! classification happens in [`interpret`] so that structured error bodies
//! are never lost to transport-level exception typing.

use std::time::Duration;

use async_trait::async_trait;
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Outgoing request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL (e.g. "departments/5")
    pub path: String,
    pub body: Option<Value>,
    /// Bearer token, attached as `Authorization: Bearer ...`
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// Raw reply: status plus parsed body (`Null` when empty)
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }
}

/// HTTP transport trait
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiReply>;
}

/// Network HTTP client (reqwest)
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl NetworkHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(err.to_string())
    } else {
        ClientError::Connection(err.to_string())
    }
}

#[async_trait]
impl HttpClient for NetworkHttpClient {
    async fn execute(&self, request: ApiRequest) -> ClientResult<ApiReply> {
        let url = self.url(&request.path);
        let mut req = self.client.request(request.method.clone(), &url);
        if let Some(token) = &request.bearer {
            req = req.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        tracing::debug!(method = %request.method, url = %url, "Sending request");
        let response = req.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiReply { status, body })
    }
}

/// Classify a reply: 2xx yields the body, anything else a structured error
pub fn interpret(reply: ApiReply) -> ClientResult<Value> {
    let status = reply.status;
    if status.is_success() {
        return Ok(reply.body);
    }

    let message = extract_message(&reply.body)
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized(message));
    }

    let details = match &reply.body {
        Value::Object(map) => map.get("errors").cloned(),
        _ => None,
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
        details,
    })
}

/// Human-readable message from an error body
///
/// Priority: `message` field, then the `errors` list, then an `error`
/// string, then a plain-text body.
pub fn extract_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => map
            .get("message")
            .and_then(non_empty_str)
            .or_else(|| map.get("errors").and_then(join_errors))
            .or_else(|| map.get("error").and_then(non_empty_str)),
        Value::String(text) => non_empty(text),
        _ => None,
    }
}

fn join_errors(errors: &Value) -> Option<String> {
    let messages: Vec<String> = match errors {
        Value::Array(items) => items.iter().filter_map(error_entry).collect(),
        // {"field": ["msg", ...]} or {"field": "msg"}
        Value::Object(map) => map
            .values()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().filter_map(error_entry).collect(),
                other => error_entry(other).into_iter().collect::<Vec<_>>(),
            })
            .collect(),
        other => error_entry(other).into_iter().collect(),
    };
    (!messages.is_empty()).then(|| messages.join("; "))
}

fn error_entry(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => non_empty(s),
        Value::Object(map) => ["msg", "message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(non_empty_str)),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value.as_str().and_then(non_empty)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
