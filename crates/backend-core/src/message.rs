//! Conversation Messages
//!
//! Role-tagged records appended by the orchestration loop. Backends only
//! read them.

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, Result};
use crate::tool::{ToolCall, ToolResult};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Tool result fed back into the conversation
    Observation,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Observation => write!(f, "observation"),
        }
    }
}

/// Tool exchange attached to a message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolData {
    /// The assistant requested a tool invocation
    Call(ToolCall),
    /// The loop executed a tool and reports its output
    Result(ToolResult),
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool call (assistant) or tool result (observation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_data: Option<ToolData>,
}

impl Message {
    /// Create a new text message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_data: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message that requested a tool
    pub fn assistant_tool_call(call: ToolCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_data: Some(ToolData::Call(call)),
        }
    }

    /// Create an observation carrying a tool result
    pub fn observation(result: ToolResult) -> Self {
        Self {
            role: Role::Observation,
            content: None,
            tool_data: Some(ToolData::Result(result)),
        }
    }

    /// Attach accompanying text
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Text content, empty if absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Tool call carried by an assistant message
    pub fn tool_call(&self) -> Option<&ToolCall> {
        match &self.tool_data {
            Some(ToolData::Call(call)) => Some(call),
            _ => None,
        }
    }

    /// Tool result carried by an observation
    pub fn tool_result(&self) -> Option<&ToolResult> {
        match &self.tool_data {
            Some(ToolData::Result(result)) => Some(result),
            _ => None,
        }
    }

    /// Check the role/tool_data invariants
    pub fn validate(&self) -> Result<()> {
        match (self.role, &self.tool_data) {
            (Role::System | Role::User, None)
            | (Role::Assistant, None | Some(ToolData::Call(_)))
            | (Role::Observation, Some(ToolData::Result(_))) => Ok(()),
            (Role::Observation, _) => Err(BackendError::InvalidMessage(
                "observation must carry a tool result".into(),
            )),
            (role, Some(_)) => Err(BackendError::InvalidMessage(format!(
                "{role} message cannot carry this tool data"
            ))),
        }
    }
}

/// Validate a whole conversation
pub fn validate_conversation(messages: &[Message]) -> Result<()> {
    messages.iter().try_for_each(Message::validate)
}
