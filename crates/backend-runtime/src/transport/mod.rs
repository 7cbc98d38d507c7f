//! Provider Transport
//!
//! The single outbound call primitive every translator goes through: POST a
//! JSON body, get a JSON body back.

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use backend_core::Result;
use serde_json::Value;

/// An outbound provider request, already in the provider's wire format
#[derive(Clone, Debug, PartialEq)]
pub struct WireRequest {
    /// Provider name, for diagnostics
    pub provider: &'static str,

    /// Endpoint URL
    pub url: String,

    /// Extra headers (authentication, API version)
    pub headers: Vec<(String, String)>,

    /// JSON body
    pub body: Value,
}

impl WireRequest {
    pub fn new(provider: &'static str, url: impl Into<String>, body: Value) -> Self {
        Self {
            provider,
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Transport trait (Strategy pattern)
///
/// Implementations report network failures as `BackendError::Transport` and
/// undecodable bodies as `BackendError::MalformedReply`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform exactly one request/response round trip
    async fn post_json(&self, request: &WireRequest) -> Result<Value>;
}
