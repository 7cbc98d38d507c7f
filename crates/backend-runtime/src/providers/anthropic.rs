//! Anthropic Translator
//!
//! Messages API. The system prompt is a top-level field, tool calls are
//! `tool_use` content blocks with object inputs, and tool results go back
//! as `tool_result` blocks inside a user turn.

use backend_core::{BackendError, GenerationParams, Message, ModelEntry, Result, Role, ToolSpec};
use serde_json::{Value, json};

use super::{check_error_body, observation_result, usage_at};
use crate::backend::{ParsedReply, ParsedToolCall, ProviderBackend, RequestContext, Translator};
use crate::transport::WireRequest;

/// Anthropic backend
pub type AnthropicBackend = ProviderBackend<AnthropicTranslator>;

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Pricing in USD per token
pub const MODELS: &[(&str, ModelEntry)] = &[
    ("claude-3-5-sonnet-20241022", ModelEntry::new(200_000, 0.000_003, 0.000_015)),
    ("claude-3-5-sonnet-20240620", ModelEntry::new(200_000, 0.000_003, 0.000_015)),
    ("claude-3-5-haiku-20241022", ModelEntry::new(200_000, 0.000_000_8, 0.000_004)),
    ("claude-3-opus-20240229", ModelEntry::new(200_000, 0.000_015, 0.000_075)),
    ("claude-3-haiku-20240307", ModelEntry::new(200_000, 0.000_000_25, 0.000_001_25)),
];

/// Anthropic Messages dialect
#[derive(Debug)]
pub struct AnthropicTranslator;

impl AnthropicTranslator {
    /// Split out the system prompt and convert the remaining messages
    pub fn convert_messages(conversation: &[Message]) -> Result<(Option<String>, Vec<Value>)> {
        let mut system: Option<String> = None;
        let mut wire_messages = Vec::with_capacity(conversation.len());

        for msg in conversation {
            match msg.role {
                Role::System => match &mut system {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(msg.text());
                    }
                    None => system = Some(msg.text().to_owned()),
                },
                Role::User => {
                    wire_messages.push(json!({
                        "role": "user",
                        "content": msg.text(),
                    }));
                }
                Role::Assistant => match msg.tool_call() {
                    // Empty text blocks are rejected in prior turns.
                    None if msg.text().is_empty() => {}
                    None => {
                        wire_messages.push(json!({
                            "role": "assistant",
                            "content": msg.text(),
                        }));
                    }
                    Some(call) => {
                        let mut content = Vec::with_capacity(2);
                        if !msg.text().is_empty() {
                            content.push(json!({"type": "text", "text": msg.text()}));
                        }
                        content.push(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        }));
                        wire_messages.push(json!({
                            "role": "assistant",
                            "content": content,
                        }));
                    }
                },
                Role::Observation => {
                    let result = observation_result(msg)?;
                    wire_messages.push(json!({
                        "role": "user",
                        "content": [{
                            "type": "tool_result",
                            "tool_use_id": result.id,
                            "content": result.named_payload(),
                        }],
                    }));
                }
            }
        }

        Ok((system, wire_messages))
    }
}

impl Translator for AnthropicTranslator {
    const PROVIDER: &'static str = "anthropic";
    const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    const DEFAULTS: GenerationParams = GenerationParams {
        temperature: 1.0,
        max_tokens: 4096,
    };

    fn models() -> &'static [(&'static str, ModelEntry)] {
        MODELS
    }

    fn tool_declarations(tools: &[ToolSpec]) -> Option<Value> {
        (!tools.is_empty()).then(|| {
            tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.json_schema(),
                    })
                })
                .collect()
        })
    }

    fn build_request(ctx: &RequestContext<'_>, conversation: &[Message]) -> Result<WireRequest> {
        let (system, messages) = Self::convert_messages(conversation)?;

        let mut body = json!({
            "model": ctx.model,
            "max_tokens": ctx.params.max_tokens,
            "temperature": ctx.params.temperature,
            "messages": messages,
        });

        if let Some(system) = system {
            body["system"] = json!(system);
        }

        if let Some(tools) = ctx.tools {
            body["tools"] = tools.clone();
        }

        Ok(
            WireRequest::new(Self::PROVIDER, format!("{}/v1/messages", ctx.base_url), body)
                .header("x-api-key", ctx.credential.expose().unwrap_or_default())
                .header("anthropic-version", ANTHROPIC_VERSION),
        )
    }

    fn parse_reply(reply: &Value) -> Result<ParsedReply> {
        check_error_body(Self::PROVIDER, reply)?;

        let content = reply["content"]
            .as_array()
            .ok_or_else(|| BackendError::malformed(Self::PROVIDER, "missing `content` array in response"))?;

        let mut text_parts: Vec<&str> = Vec::new();
        let mut tool_calls = Vec::new();

        for block in content {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(t) = block["text"].as_str() {
                        text_parts.push(t);
                    }
                }
                Some("tool_use") => {
                    let name = block["name"].as_str().ok_or_else(|| {
                        BackendError::malformed(Self::PROVIDER, "tool_use block without a name")
                    })?;
                    tool_calls.push(ParsedToolCall {
                        id: block["id"].as_str().map(str::to_owned),
                        name: name.to_owned(),
                        arguments: block.get("input").cloned().unwrap_or(Value::Null),
                    });
                }
                _ => {}
            }
        }

        Ok(ParsedReply {
            content: (!text_parts.is_empty()).then(|| text_parts.concat()),
            tool_calls,
            usage: usage_at(reply, "/usage/input_tokens", &["/usage/output_tokens"]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_core::ToolCall;
    use serde_json::Map;

    #[test]
    fn test_system_is_split_out() {
        let (system, messages) = AnthropicTranslator::convert_messages(&[
            Message::system("Be terse."),
            Message::system("Never guess."),
            Message::user("hi"),
        ])
        .unwrap();

        assert_eq!(system.as_deref(), Some("Be terse.\nNever guess."));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn test_tool_use_round() {
        let mut args = Map::new();
        args.insert("path".into(), json!("/tmp/a"));
        let call = ToolCall::new("toolu_01", "read_file", args);

        let (_, messages) = AnthropicTranslator::convert_messages(&[
            Message::assistant_tool_call(call.clone()).with_content("Checking."),
            Message::observation(call.result(json!({"bytes": 120}))),
        ])
        .unwrap();

        let blocks = messages[0]["content"].as_array().unwrap();
        assert_eq!(blocks[0]["type"], "text");
        assert_eq!(blocks[1]["type"], "tool_use");
        assert_eq!(blocks[1]["input"]["path"], "/tmp/a");

        let result = &messages[1]["content"][0];
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(result["type"], "tool_result");
        assert_eq!(result["tool_use_id"], "toolu_01");
        let payload: Value = serde_json::from_str(result["content"].as_str().unwrap()).unwrap();
        assert_eq!(payload["name"], "read_file");
        assert_eq!(payload["result"], json!({"bytes": 120}));
    }

    #[test]
    fn test_empty_assistant_turn_is_skipped() {
        let (_, messages) = AnthropicTranslator::convert_messages(&[
            Message::user("hi"),
            Message::assistant(""),
            Message::user("still there?"),
        ])
        .unwrap();

        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m["role"] == "user"));
    }

    #[test]
    fn test_parse_mixed_reply() {
        let reply = json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Let me look."},
                {"type": "tool_use", "id": "toolu_9", "name": "read_file", "input": {"path": "/etc/passwd"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 100, "output_tokens": 20}
        });

        let parsed = AnthropicTranslator::parse_reply(&reply).unwrap();
        assert_eq!(parsed.content.as_deref(), Some("Let me look."));
        assert_eq!(parsed.tool_calls[0].id.as_deref(), Some("toolu_9"));
        assert_eq!(parsed.usage, Some(backend_core::TokenUsage::new(100, 20)));
    }

    #[test]
    fn test_error_envelope() {
        let reply = json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        });
        let err = AnthropicTranslator::parse_reply(&reply).unwrap_err();
        assert_eq!(err.to_string(), "transport error from anthropic: Overloaded");
    }

    #[test]
    fn test_request_headers_and_url() {
        let params = GenerationParams {
            temperature: 0.2,
            max_tokens: 512,
        };
        let credential = backend_core::Credential::from("sk-ant-test");
        let ctx = RequestContext {
            model: "claude-3-haiku-20240307",
            params: &params,
            tools: None,
            base_url: "https://api.anthropic.com",
            credential: &credential,
        };

        let request = AnthropicTranslator::build_request(&ctx, &[Message::user("hi")]).unwrap();
        assert_eq!(request.url, "https://api.anthropic.com/v1/messages");
        assert!(request.headers.contains(&("x-api-key".to_owned(), "sk-ant-test".to_owned())));
        assert!(request.headers.contains(&("anthropic-version".to_owned(), "2023-06-01".to_owned())));
        assert_eq!(request.body["max_tokens"], 512);
        assert!(request.body.get("system").is_none());
        assert!(request.body.get("tools").is_none());
    }
}
