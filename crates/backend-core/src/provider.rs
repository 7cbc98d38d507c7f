//! Backend Contract
//!
//! Defines a common interface for all LLM providers (Ollama, OpenAI,
//! Anthropic, Together, Gemini) so the orchestration loop can talk to any of
//! them without knowing their wire formats.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use backend_core::{Backend, Message};
//!
//! let backend = backend_runtime::create_backend("planner", "gpt-4o", tools, credential, &config)?;
//!
//! let response = backend.send(&conversation).await;
//! if let Some(call) = response.tool_call() {
//!     // execute the tool, append an observation, send again
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::message::Message;
use crate::tool::ToolCall;

/// Pricing and context metadata for a model
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Context window in tokens
    pub max_context: u32,

    /// Cost per prompt token (USD)
    pub cost_per_input_token: f64,

    /// Cost per generated token (USD)
    pub cost_per_output_token: f64,
}

impl ModelEntry {
    pub const fn new(max_context: u32, cost_per_input_token: f64, cost_per_output_token: f64) -> Self {
        Self {
            max_context,
            cost_per_input_token,
            cost_per_output_token,
        }
    }

    /// Entry for a model that costs nothing per token
    pub const fn free(max_context: u32) -> Self {
        Self::new(max_context, 0.0, 0.0)
    }

    /// Price a call from its token usage
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        let cost = f64::from(usage.input_tokens) * self.cost_per_input_token
            + f64::from(usage.output_tokens) * self.cost_per_output_token;
        cost.max(0.0)
    }

    /// Whether a prompt of `tokens` fits the context window
    pub const fn fits(&self, tokens: u32) -> bool {
        tokens <= self.max_context
    }
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

/// Role-scoped generation parameters, fixed at construction
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Temperature for sampling (0.0 = deterministic)
    pub temperature: f64,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Resolve against `config` for `role`, falling back to `defaults`
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resolve(config: &BackendConfig, role: &str, defaults: Self) -> Self {
        Self {
            temperature: config
                .param(role, "temperature")
                .unwrap_or(defaults.temperature),
            max_tokens: config
                .param(role, "max_tokens")
                .map_or(defaults.max_tokens, |v| v as u32),
        }
    }
}

/// Opaque provider credential
///
/// The value never appears in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Some(secret.into()))
    }

    /// No credential (local providers)
    pub const fn none() -> Self {
        Self(None)
    }

    pub fn expose(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential(***)"),
            None => f.write_str("Credential(None)"),
        }
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for Credential {
    fn from(secret: String) -> Self {
        Self::new(secret)
    }
}

/// The meaningful part of a backend response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Natural-language reply
    Content(String),
    /// One tool invocation request
    ToolCall(ToolCall),
    /// The call failed
    Error(String),
}

/// Uniform result of one `send`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    pub payload: Payload,

    /// Cost of the call (USD), never negative
    pub cost: f64,
}

impl BackendResponse {
    pub fn from_content(content: impl Into<String>, cost: f64) -> Self {
        Self {
            payload: Payload::Content(content.into()),
            cost: cost.max(0.0),
        }
    }

    pub fn from_tool_call(call: ToolCall, cost: f64) -> Self {
        Self {
            payload: Payload::ToolCall(call),
            cost: cost.max(0.0),
        }
    }

    /// Error response with the diagnostic text of `err`
    pub fn failed(err: &BackendError) -> Self {
        Self {
            payload: Payload::Error(format!("Backend Error: {err}")),
            cost: 0.0,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.payload {
            Payload::Content(text) => Some(text),
            _ => None,
        }
    }

    pub fn tool_call(&self) -> Option<&ToolCall> {
        match &self.payload {
            Payload::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.payload {
            Payload::Error(err) => Some(err),
            _ => None,
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self.payload, Payload::Error(_))
    }
}

/// Strategy trait for LLM backends
///
/// One instance per agent role. Instances hold only construction-time state,
/// so they can be shared across tasks.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g. "ollama", "openai")
    fn provider(&self) -> &'static str;

    /// Active model identifier
    fn model(&self) -> &str;

    /// Agent role this backend was built for
    fn role(&self) -> &str;

    /// Generation parameters resolved for the role
    fn params(&self) -> &GenerationParams;

    /// Send the conversation and return the unified response.
    ///
    /// Never fails outward: transport and reply errors are reported through
    /// [`Payload::Error`]. Performs exactly one provider call.
    async fn send(&self, conversation: &[Message]) -> BackendResponse;
}
