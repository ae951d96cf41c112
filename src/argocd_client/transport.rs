//! Capabilities the client is built from: base URL discovery and HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use hyper::ext::ReasonPhrase;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::types::StatusError;

/// Resolves the base URL of a backend service by name.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn get_base_url(&self, service: &str) -> Result<String, StatusError>;
}

/// Performs a GET request and hands back the raw response.
///
/// Implementations report connection-level failures as
/// [`StatusError::Transport`]; HTTP status handling is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, url: &Url) -> Result<HttpResponse, StatusError>;
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Discovery backed by a URL pattern, e.g. `http://localhost:7007/api/{{pluginId}}`.
///
/// A pattern without the placeholder is returned unchanged for every service.
#[derive(Debug, Clone)]
pub struct UrlPatternDiscovery {
    pattern: String,
}

const PLUGIN_ID_PLACEHOLDER: &str = "{{pluginId}}";

impl UrlPatternDiscovery {
    pub fn compile(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

#[async_trait]
impl Discovery for UrlPatternDiscovery {
    async fn get_base_url(&self, service: &str) -> Result<String, StatusError> {
        Ok(self.pattern.replace(PLUGIN_ID_PLACEHOLDER, service))
    }
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, StatusError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StatusError::Configuration(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, url: &Url) -> Result<HttpResponse, StatusError> {
        let transport_error = |err: reqwest::Error| StatusError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        };

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        // HTTP/1 servers may send a non-standard reason line; keep it as sent.
        let status_text = match response.extensions().get::<ReasonPhrase>() {
            Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
            None => status.canonical_reason().unwrap_or_default().to_string(),
        };
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text,
            body: body.to_vec(),
        })
    }
}
