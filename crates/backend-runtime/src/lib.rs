//! # backend-runtime
//!
//! Provider backends for the `backend-core` contract.
//!
//! ## Providers
//!
//! - **Ollama**: local inference, free, no credential
//! - **OpenAI**: Chat Completions
//! - **Anthropic**: Messages API
//! - **Together**: OpenAI-compatible open-weight models
//! - **Gemini**: `generateContent`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use backend_runtime::{create_backend, BackendConfig, Credential, Message, ToolSpec};
//!
//! let tools = [ToolSpec::new("read_file", "Read a file")
//!     .required_param("path", "string", "File path")];
//! let backend = create_backend("planner", "gpt-4o", &tools, Credential::new(key), &config)?;
//!
//! let response = backend.send(&[Message::user("What is in /etc/passwd?")]).await;
//! if let Some(call) = response.tool_call() {
//!     // run the tool, append an observation, send again
//! }
//! ```

pub mod backend;
pub mod providers;
pub mod registry;
pub mod transport;

pub use backend::{ProviderBackend, Translator};
pub use registry::{ProviderKind, create_backend, create_backend_with_transport, registry};
pub use transport::{HttpTransport, MockTransport, Transport, WireRequest};

// Re-export core types for convenience
pub use backend_core::{
    Backend, BackendConfig, BackendError, BackendResponse, Credential, Message, Payload, Result,
    Role, ToolCall, ToolResult, ToolSpec,
};
