//! # backend-core
//!
//! Provider-agnostic vocabulary and contract for talking to LLM backends.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   &[Message]   ┌───────────────────┐   wire JSON   ┌──────────┐
//! │ Orchestration    │───────────────▶│  Backend          │──────────────▶│ Provider │
//! │ loop             │◀───────────────│  (translator)     │◀──────────────│ API      │
//! └──────────────────┘ BackendResponse└───────────────────┘               └──────────┘
//! ```
//!
//! The `Backend` trait hides every provider difference: how tool calls are
//! encoded, whether arguments are strings or objects, whether call ids
//! exist. Callers only ever see `Message`, `ToolCall` and `BackendResponse`.

pub mod config;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

pub use config::{BackendConfig, ProviderSettings, RoleParams};
pub use error::{BackendError, Result};
pub use message::{Message, Role, ToolData};
pub use provider::{
    Backend, BackendResponse, Credential, GenerationParams, ModelEntry, Payload, TokenUsage,
};
pub use tool::{ParameterSpec, ToolCall, ToolResult, ToolSpec};
