//! Mock Transport
//!
//! For testing and demo purposes. Replays canned provider replies and
//! records every request it was handed.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use backend_core::{BackendError, Result};
use serde_json::Value;

use super::{Transport, WireRequest};

#[derive(Clone, Debug)]
enum MockReply {
    Json(Value),
    Fail(String),
}

/// In-memory transport with scripted replies
///
/// Replies are consumed in order; the last one repeats once the script
/// runs out.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<WireRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `reply`
    pub fn replying(reply: Value) -> Self {
        Self::new().then_reply(reply)
    }

    /// Always fail like an unreachable host
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::new().then_fail(reason)
    }

    /// Queue a successful reply
    pub fn then_reply(self, reply: Value) -> Self {
        self.push(MockReply::Json(reply));
        self
    }

    /// Queue a transport failure
    pub fn then_fail(self, reason: impl Into<String>) -> Self {
        self.push(MockReply::Fail(reason.into()));
        self
    }

    fn push(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<WireRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Body of the most recent request
    pub fn last_body(&self) -> Option<Value> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|r| r.body.clone())
    }

    /// Number of calls performed
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_reply(&self) -> Option<MockReply> {
        let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, request: &WireRequest) -> Result<Value> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match self.next_reply() {
            Some(MockReply::Json(reply)) => Ok(reply),
            Some(MockReply::Fail(reason)) => Err(BackendError::transport(request.provider, reason)),
            None => Err(BackendError::transport(request.provider, "no reply scripted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_replies() {
        let transport = MockTransport::replying(json!({"n": 1}))
            .then_fail("connection reset")
            .then_reply(json!({"n": 2}));
        let request = WireRequest::new("openai", "http://mock", json!({}));

        assert_eq!(transport.post_json(&request).await.unwrap(), json!({"n": 1}));
        assert!(transport.post_json(&request).await.is_err());
        assert_eq!(transport.post_json(&request).await.unwrap(), json!({"n": 2}));
        // Last reply repeats.
        assert_eq!(transport.post_json(&request).await.unwrap(), json!({"n": 2}));
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn test_unscripted_fails() {
        let transport = MockTransport::new();
        let request = WireRequest::new("gemini", "http://mock", json!({"x": true}));

        let err = transport.post_json(&request).await.unwrap_err();
        assert!(err.to_string().contains("gemini"));
        assert_eq!(transport.last_body(), Some(json!({"x": true})));
    }
}
