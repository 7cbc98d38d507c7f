//! Ollama Translator
//!
//! Local inference through Ollama's `/api/chat`. Tool call arguments travel
//! as JSON objects and Ollama assigns no call ids, so ids are synthesized.
//! Local models are free.

use backend_core::{BackendError, GenerationParams, Message, ModelEntry, Result, Role, ToolSpec};
use serde_json::{Value, json};

use super::{check_error_body, function_tool, observation_result, usage_at};
use crate::backend::{ParsedReply, ParsedToolCall, ProviderBackend, RequestContext, Translator};
use crate::transport::WireRequest;

/// Ollama backend
pub type OllamaBackend = ProviderBackend<OllamaTranslator>;

/// Locally pulled models; running them costs nothing per token
pub const MODELS: &[(&str, ModelEntry)] = &[
    ("gemma2:2b-instruct-q4_0", ModelEntry::free(2048)),
    ("llama3", ModelEntry::free(8192)),
    ("llama3:8b", ModelEntry::free(8192)),
    ("llama3:70b", ModelEntry::free(8192)),
    ("llama3.1", ModelEntry::free(131_072)),
    ("llama3.2", ModelEntry::free(131_072)),
    ("mistral", ModelEntry::free(8192)),
    ("mistral:7b-instruct-v0.2", ModelEntry::free(8192)),
    ("codellama", ModelEntry::free(16384)),
    ("qwen2.5-coder", ModelEntry::free(32768)),
];

/// Ollama wire dialect
#[derive(Debug)]
pub struct OllamaTranslator;

impl OllamaTranslator {
    /// Convert generic messages to Ollama chat messages
    pub fn convert_messages(conversation: &[Message]) -> Result<Vec<Value>> {
        conversation
            .iter()
            .map(|m| -> Result<Value> {
                match m.role {
                    Role::System | Role::User => Ok(json!({
                        "role": m.role.to_string(),
                        "content": m.text(),
                    })),
                    Role::Assistant => {
                        let mut msg = json!({
                            "role": "assistant",
                            "content": m.text(),
                        });
                        if let Some(call) = m.tool_call() {
                            msg["tool_calls"] = json!([{
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments,
                                }
                            }]);
                        }
                        Ok(msg)
                    }
                    Role::Observation => {
                        let result = observation_result(m)?;
                        Ok(json!({
                            "role": "tool",
                            "tool_name": result.name,
                            "content": result.serialized(),
                        }))
                    }
                }
            })
            .collect()
    }
}

impl Translator for OllamaTranslator {
    const PROVIDER: &'static str = "ollama";
    const DEFAULT_BASE_URL: &'static str = "http://localhost:11434";
    const DEFAULTS: GenerationParams = GenerationParams {
        temperature: 0.7,
        max_tokens: 2048,
    };
    const REQUIRES_CREDENTIAL: bool = false;

    fn models() -> &'static [(&'static str, ModelEntry)] {
        MODELS
    }

    fn tool_declarations(tools: &[ToolSpec]) -> Option<Value> {
        (!tools.is_empty()).then(|| Value::Array(tools.iter().map(function_tool).collect()))
    }

    fn build_request(ctx: &RequestContext<'_>, conversation: &[Message]) -> Result<WireRequest> {
        let mut body = json!({
            "model": ctx.model,
            "messages": Self::convert_messages(conversation)?,
            "stream": false,
            "options": {
                "temperature": ctx.params.temperature,
                "num_predict": ctx.params.max_tokens,
            },
        });

        if let Some(tools) = ctx.tools {
            body["tools"] = tools.clone();
        }

        let mut request = WireRequest::new(Self::PROVIDER, format!("{}/api/chat", ctx.base_url), body);
        // Ollama itself ignores auth; reverse proxies in front of it may not.
        if let Some(token) = ctx.credential.expose() {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        Ok(request)
    }

    fn parse_reply(reply: &Value) -> Result<ParsedReply> {
        check_error_body(Self::PROVIDER, reply)?;

        let message = reply
            .get("message")
            .filter(|m| m.is_object())
            .ok_or_else(|| BackendError::malformed(Self::PROVIDER, "missing `message` in response"))?;

        let tool_calls = message
            .get("tool_calls")
            .and_then(Value::as_array)
            .map(|calls| {
                calls
                    .iter()
                    .map(|tc| -> Result<ParsedToolCall> {
                        let function = &tc["function"];
                        let name = function["name"].as_str().ok_or_else(|| {
                            BackendError::malformed(Self::PROVIDER, "tool call without a function name")
                        })?;
                        Ok(ParsedToolCall {
                            id: tc.get("id").and_then(Value::as_str).map(str::to_owned),
                            name: name.to_owned(),
                            arguments: function.get("arguments").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(ParsedReply {
            content: message
                .get("content")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
            tool_calls,
            usage: usage_at(reply, "/prompt_eval_count", &["/eval_count"]),
        })
    }

    /// `OLLAMA_HOST` as the Ollama CLI understands it (`host:port` or a URL)
    fn base_url_from_env() -> Option<String> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let host = host.trim();
        if host.is_empty() {
            return None;
        }
        if host.starts_with("http://") || host.starts_with("https://") {
            Some(host.to_owned())
        } else {
            Some(format!("http://{host}"))
        }
    }
}
