//! Generic HTTP transport for the cities API
//!
//! `Transport` is the seam between the console state machines and the
//! network. `HttpTransport` is the reqwest implementation; tests script
//! their own.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{status_message, ConsoleError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 204, or a 2xx with an empty body.
    NoContent,
    Json(Value),
}

impl Reply {
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, TransportError> {
        match self {
            Reply::Json(value) => {
                serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
            }
            Reply::NoContent => Err(TransportError::Decode(
                "expected a JSON body, got no content".to_string(),
            )),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request against `path` (relative to the API base).
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Reply, TransportError>;
}

/// Build the failure for a non-2xx response.
///
/// Prefers a string `message` or `error` field from a JSON body, falling
/// back to the status category.
pub fn http_failure(status: u16, body: &str) -> TransportError {
    let from_body = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        ["message", "error"].iter().find_map(|key| {
            json.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    });

    TransportError::Http {
        status,
        message: from_body.unwrap_or_else(|| status_message(status)),
    }
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConsoleError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsoleError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Reply, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = method.as_str(), %url, "HTTP request");

        let mut request = self
            .http
            .request(method.into(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(http_failure(status.as_u16(), &text));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Reply::NoContent);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Reply::NoContent);
        }

        serde_json::from_slice(&bytes)
            .map(Reply::Json)
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
