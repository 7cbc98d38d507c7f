//! Chat Completions dialect
//!
//! The OpenAI wire format, also spoken by Together's OpenAI-compatible
//! endpoint. System messages stay in the `messages` array, tool calls go in
//! `assistant.tool_calls` with JSON-encoded argument strings, and tool
//! results use `role: "tool"` with a `tool_call_id`.

use backend_core::{BackendError, Message, Result, Role, ToolSpec};
use serde_json::{Value, json};

use super::{check_error_body, function_tool, observation_result, usage_at};
use crate::backend::{ParsedReply, ParsedToolCall, RequestContext};
use crate::transport::WireRequest;

/// Wrap each tool as `{"type": "function", "function": {...}}`
pub fn tool_declarations(tools: &[ToolSpec]) -> Option<Value> {
    (!tools.is_empty()).then(|| Value::Array(tools.iter().map(function_tool).collect()))
}

/// Convert generic messages to the Chat Completions wire format
pub fn messages(conversation: &[Message]) -> Result<Vec<Value>> {
    let mut wire_messages = Vec::with_capacity(conversation.len());

    for msg in conversation {
        match msg.role {
            Role::System | Role::User => {
                wire_messages.push(json!({
                    "role": msg.role.to_string(),
                    "content": msg.text(),
                }));
            }
            Role::Assistant => match msg.tool_call() {
                None => {
                    wire_messages.push(json!({
                        "role": "assistant",
                        "content": msg.text(),
                    }));
                }
                Some(call) => {
                    wire_messages.push(json!({
                        "role": "assistant",
                        "content": msg.content,
                        "tool_calls": [{
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": Value::Object(call.arguments.clone()).to_string(),
                            }
                        }],
                    }));
                }
            },
            Role::Observation => {
                let result = observation_result(msg)?;
                wire_messages.push(json!({
                    "role": "tool",
                    "tool_call_id": result.id,
                    "content": result.named_payload(),
                }));
            }
        }
    }

    Ok(wire_messages)
}

/// Build a `/chat/completions` request with bearer authentication
pub fn build_request(
    provider: &'static str,
    ctx: &RequestContext<'_>,
    conversation: &[Message],
) -> Result<WireRequest> {
    let mut body = json!({
        "model": ctx.model,
        "messages": messages(conversation)?,
        "temperature": ctx.params.temperature,
        "max_tokens": ctx.params.max_tokens,
    });

    if let Some(tools) = ctx.tools {
        body["tools"] = tools.clone();
    }

    let token = ctx.credential.expose().unwrap_or_default();
    Ok(
        WireRequest::new(provider, format!("{}/chat/completions", ctx.base_url), body)
            .header("authorization", format!("Bearer {token}")),
    )
}

/// Parse a non-streaming Chat Completions response
pub fn parse_reply(provider: &str, reply: &Value) -> Result<ParsedReply> {
    check_error_body(provider, reply)?;

    let message = reply
        .pointer("/choices/0/message")
        .filter(|m| m.is_object())
        .ok_or_else(|| BackendError::malformed(provider, "missing `choices[0].message` in response"))?;

    let mut tool_calls = Vec::new();
    if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
        for tc in calls {
            let function = &tc["function"];
            let name = function["name"]
                .as_str()
                .ok_or_else(|| BackendError::malformed(provider, "tool call without a function name"))?;

            tool_calls.push(ParsedToolCall {
                id: tc.get("id").and_then(Value::as_str).map(str::to_owned),
                name: name.to_owned(),
                arguments: function.get("arguments").cloned().unwrap_or(Value::Null),
            });
        }
    }

    Ok(ParsedReply {
        content: message
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_owned),
        tool_calls,
        usage: usage_at(reply, "/usage/prompt_tokens", &["/usage/completion_tokens"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_core::{ToolCall, ToolResult};
    use serde_json::Map;

    #[test]
    fn test_assistant_tool_call_arguments_are_a_string() {
        let mut args = Map::new();
        args.insert("path".into(), json!("/etc/passwd"));
        let messages = messages(&[Message::assistant_tool_call(ToolCall::new(
            "call_abc",
            "read_file",
            args,
        ))])
        .unwrap();

        let call = &messages[0]["tool_calls"][0];
        assert_eq!(messages[0]["content"], Value::Null);
        assert_eq!(call["id"], "call_abc");
        assert_eq!(call["type"], "function");
        let arguments: Value = serde_json::from_str(call["function"]["arguments"].as_str().unwrap()).unwrap();
        assert_eq!(arguments, json!({"path": "/etc/passwd"}));
    }

    #[test]
    fn test_observation_carries_id_name_and_result() {
        let messages = messages(&[Message::observation(ToolResult::new(
            "call_abc",
            "read_file",
            json!({"bytes": 120}),
        ))])
        .unwrap();

        assert_eq!(messages[0]["role"], "tool");
        assert_eq!(messages[0]["tool_call_id"], "call_abc");
        let payload: Value = serde_json::from_str(messages[0]["content"].as_str().unwrap()).unwrap();
        assert_eq!(payload, json!({"name": "read_file", "result": {"bytes": 120}}));
    }

    #[test]
    fn test_parse_text_reply() {
        let reply = json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        });
        let parsed = parse_reply("openai", &reply).unwrap();
        assert_eq!(parsed.content.as_deref(), Some("Hello!"));
        assert!(parsed.tool_calls.is_empty());
        assert_eq!(parsed.usage.map(|u| u.output_tokens), Some(3));
    }

    #[test]
    fn test_missing_choices_is_malformed() {
        let err = parse_reply("together", &json!({"id": "x", "choices": []})).unwrap_err();
        assert!(err.to_string().starts_with("malformed reply from together"));
    }
}
