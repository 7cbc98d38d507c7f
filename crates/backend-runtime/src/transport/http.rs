//! HTTP Transport
//!
//! `reqwest`-backed transport used for every real provider call.

use std::time::Duration;

use async_trait::async_trait;
use backend_core::{BackendError, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use super::{Transport, WireRequest};

/// JSON-over-HTTP transport
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose calls time out after `timeout_secs`
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BackendError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn headers(request: &WireRequest) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| BackendError::transport(request.provider, format!("invalid header name: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| BackendError::transport(request.provider, format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, request: &WireRequest) -> Result<Value> {
        let provider = request.provider;
        let headers = Self::headers(request)?;

        let resp = self
            .client
            .post(&request.url)
            .headers(headers)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::transport(provider, format!("request timed out: {e}"))
                } else {
                    BackendError::transport(provider, e)
                }
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| BackendError::transport(provider, format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(BackendError::transport(provider, format!("API returned {status}: {text}")));
        }

        serde_json::from_str(&text)
            .map_err(|e| BackendError::malformed(provider, format!("invalid JSON response: {e}")))
    }
}
