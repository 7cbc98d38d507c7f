//! Provider Translators
//!
//! One translator per supported provider. OpenAI and Together share the
//! Chat Completions dialect in [`chat_completions`].

pub mod anthropic;
pub mod chat_completions;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod together;

pub use anthropic::{AnthropicBackend, AnthropicTranslator};
pub use gemini::{GeminiBackend, GeminiTranslator};
pub use ollama::{OllamaBackend, OllamaTranslator};
pub use openai::{OpenAiBackend, OpenAiTranslator};
pub use together::{TogetherBackend, TogetherTranslator};

use backend_core::{BackendError, Message, Result, TokenUsage, ToolResult, ToolSpec};
use serde_json::{Value, json};

/// `{"type": "function", "function": {...}}` declaration shared by the
/// OpenAI, Together and Ollama dialects
pub(crate) fn function_tool(spec: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": spec.description,
            "parameters": spec.json_schema(),
        }
    })
}

/// Tool result of an observation
pub(crate) fn observation_result(msg: &Message) -> Result<&ToolResult> {
    msg.tool_result()
        .ok_or_else(|| BackendError::InvalidMessage("observation must carry a tool result".into()))
}

/// Fail on an `error` object embedded in an otherwise successful reply
pub(crate) fn check_error_body(provider: &str, reply: &Value) -> Result<()> {
    match reply.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(message)) => Err(BackendError::transport(provider, message)),
        Some(err) => {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| err.to_string(), str::to_owned);
            Err(BackendError::transport(provider, message))
        }
    }
}

/// Read token usage from two counters; `None` when the provider sent neither
pub(crate) fn usage_at(reply: &Value, input: &str, output: &[&str]) -> Option<TokenUsage> {
    let input_tokens = reply.pointer(input).and_then(Value::as_u64);
    let output_counts: Vec<u64> = output
        .iter()
        .filter_map(|path| reply.pointer(path).and_then(Value::as_u64))
        .collect();

    if input_tokens.is_none() && output_counts.is_empty() {
        return None;
    }

    Some(TokenUsage::new(
        saturate(input_tokens.unwrap_or(0)),
        saturate(output_counts.iter().sum()),
    ))
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
