//! OpenAI Translator

use backend_core::{GenerationParams, Message, ModelEntry, Result, ToolSpec};
use serde_json::Value;

use super::chat_completions;
use crate::backend::{ParsedReply, ProviderBackend, RequestContext, Translator};
use crate::transport::WireRequest;

/// OpenAI backend
pub type OpenAiBackend = ProviderBackend<OpenAiTranslator>;

/// Pricing in USD per token
pub const MODELS: &[(&str, ModelEntry)] = &[
    ("gpt-4o", ModelEntry::new(128_000, 0.000_002_5, 0.000_01)),
    ("gpt-4o-2024-08-06", ModelEntry::new(128_000, 0.000_002_5, 0.000_01)),
    ("gpt-4o-mini", ModelEntry::new(128_000, 0.000_000_15, 0.000_000_6)),
    ("gpt-4-turbo", ModelEntry::new(128_000, 0.000_01, 0.000_03)),
    ("gpt-4", ModelEntry::new(8192, 0.000_03, 0.000_06)),
    ("gpt-3.5-turbo", ModelEntry::new(16_385, 0.000_000_5, 0.000_001_5)),
];

/// OpenAI Chat Completions dialect
#[derive(Debug)]
pub struct OpenAiTranslator;

impl Translator for OpenAiTranslator {
    const PROVIDER: &'static str = "openai";
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    const DEFAULTS: GenerationParams = GenerationParams {
        temperature: 1.0,
        max_tokens: 4096,
    };

    fn models() -> &'static [(&'static str, ModelEntry)] {
        MODELS
    }

    fn tool_declarations(tools: &[ToolSpec]) -> Option<Value> {
        chat_completions::tool_declarations(tools)
    }

    fn build_request(ctx: &RequestContext<'_>, conversation: &[Message]) -> Result<WireRequest> {
        chat_completions::build_request(Self::PROVIDER, ctx, conversation)
    }

    fn parse_reply(reply: &Value) -> Result<ParsedReply> {
        chat_completions::parse_reply(Self::PROVIDER, reply)
    }
}
