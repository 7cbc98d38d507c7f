//! Gemini Translator
//!
//! `generateContent` on the v1beta API. Assistant turns use the `model`
//! role, tools are `functionDeclarations` with upper-case schema types, and
//! results go back as `functionResponse` parts keyed by tool name.
//! Thinking tokens are billed as output.

use backend_core::{BackendError, GenerationParams, Message, ModelEntry, Result, Role, ToolSpec};
use serde_json::{Map, Value, json};

use super::{check_error_body, observation_result, usage_at};
use crate::backend::{ParsedReply, ParsedToolCall, ProviderBackend, RequestContext, Translator};
use crate::transport::WireRequest;

/// Gemini backend
pub type GeminiBackend = ProviderBackend<GeminiTranslator>;

/// Pricing in USD per token (prompts up to 128k tokens)
pub const MODELS: &[(&str, ModelEntry)] = &[
    ("gemini-1.5-pro", ModelEntry::new(2_097_152, 0.000_001_25, 0.000_005)),
    ("gemini-1.5-flash", ModelEntry::new(1_048_576, 0.000_000_075, 0.000_000_3)),
    ("gemini-2.0-flash", ModelEntry::new(1_048_576, 0.000_000_1, 0.000_000_4)),
];

/// Gemini `generateContent` dialect
#[derive(Debug)]
pub struct GeminiTranslator;

impl GeminiTranslator {
    /// Function declaration with Gemini's upper-case OpenAPI types
    pub fn function_declaration(spec: &ToolSpec) -> Value {
        let mut decl = json!({
            "name": spec.name,
            "description": spec.description,
        });

        // Gemini rejects an OBJECT schema with empty `properties`.
        if !spec.parameters.is_empty() {
            let properties: Map<String, Value> = spec
                .parameters
                .iter()
                .map(|(name, p)| {
                    (
                        name.clone(),
                        json!({
                            "type": p.param_type.to_uppercase(),
                            "description": p.description,
                        }),
                    )
                })
                .collect();

            decl["parameters"] = json!({
                "type": "OBJECT",
                "properties": properties,
                "required": spec.required.iter().collect::<Vec<_>>(),
            });
        }

        decl
    }

    /// Split out the system instruction and convert the remaining messages
    pub fn convert_messages(conversation: &[Message]) -> Result<(Option<String>, Vec<Value>)> {
        let mut system: Vec<&str> = Vec::new();
        let mut contents = Vec::with_capacity(conversation.len());

        for msg in conversation {
            match msg.role {
                Role::System => system.push(msg.text()),
                Role::User => {
                    contents.push(json!({
                        "role": "user",
                        "parts": [{"text": msg.text()}],
                    }));
                }
                Role::Assistant => {
                    let mut parts = Vec::with_capacity(2);
                    if !msg.text().is_empty() {
                        parts.push(json!({"text": msg.text()}));
                    }
                    if let Some(call) = msg.tool_call() {
                        parts.push(json!({
                            "functionCall": {
                                "name": call.name,
                                "args": call.arguments,
                            }
                        }));
                    }
                    // A turn without parts is rejected.
                    if !parts.is_empty() {
                        contents.push(json!({
                            "role": "model",
                            "parts": parts,
                        }));
                    }
                }
                Role::Observation => {
                    let result = observation_result(msg)?;
                    contents.push(json!({
                        "role": "user",
                        "parts": [{
                            "functionResponse": {
                                "name": result.name,
                                "response": {"result": result.result},
                            }
                        }],
                    }));
                }
            }
        }

        let system = (!system.is_empty()).then(|| system.join("\n"));
        Ok((system, contents))
    }
}

impl Translator for GeminiTranslator {
    const PROVIDER: &'static str = "gemini";
    const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";
    const DEFAULTS: GenerationParams = GenerationParams {
        temperature: 1.0,
        max_tokens: 8192,
    };

    fn models() -> &'static [(&'static str, ModelEntry)] {
        MODELS
    }

    fn tool_declarations(tools: &[ToolSpec]) -> Option<Value> {
        (!tools.is_empty()).then(|| {
            let declarations: Vec<Value> = tools.iter().map(Self::function_declaration).collect();
            json!([{ "functionDeclarations": declarations }])
        })
    }

    fn build_request(ctx: &RequestContext<'_>, conversation: &[Message]) -> Result<WireRequest> {
        let (system, contents) = Self::convert_messages(conversation)?;

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": ctx.params.temperature,
                "maxOutputTokens": ctx.params.max_tokens,
            },
        });

        if let Some(system) = system {
            body["systemInstruction"] = json!({"parts": [{"text": system}]});
        }

        if let Some(tools) = ctx.tools {
            body["tools"] = tools.clone();
        }

        let url = format!("{}/v1beta/models/{}:generateContent", ctx.base_url, ctx.model);
        Ok(WireRequest::new(Self::PROVIDER, url, body)
            .header("x-goog-api-key", ctx.credential.expose().unwrap_or_default()))
    }

    fn parse_reply(reply: &Value) -> Result<ParsedReply> {
        check_error_body(Self::PROVIDER, reply)?;

        let Some(candidate) = reply.pointer("/candidates/0").filter(|c| c.is_object()) else {
            let reason = reply
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .map_or_else(
                    || "missing `candidates[0]` in response".to_owned(),
                    |r| format!("prompt blocked: {r}"),
                );
            return Err(BackendError::malformed(Self::PROVIDER, reason));
        };

        let mut text_parts: Vec<&str> = Vec::new();
        let mut tool_calls = Vec::new();

        let parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for part in parts {
            if let Some(call) = part.get("functionCall") {
                let name = call["name"].as_str().ok_or_else(|| {
                    BackendError::malformed(Self::PROVIDER, "functionCall without a name")
                })?;
                tool_calls.push(ParsedToolCall {
                    id: call.get("id").and_then(Value::as_str).map(str::to_owned),
                    name: name.to_owned(),
                    arguments: call.get("args").cloned().unwrap_or(Value::Null),
                });
            } else if part.get("thought").and_then(Value::as_bool) != Some(true) {
                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    text_parts.push(text);
                }
            }
        }

        Ok(ParsedReply {
            content: (!text_parts.is_empty()).then(|| text_parts.concat()),
            tool_calls,
            usage: usage_at(
                reply,
                "/usageMetadata/promptTokenCount",
                &["/usageMetadata/candidatesTokenCount", "/usageMetadata/thoughtsTokenCount"],
            ),
        })
    }
}
