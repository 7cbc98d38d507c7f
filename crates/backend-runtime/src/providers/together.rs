//! Together Translator
//!
//! Together serves open-weight models behind an OpenAI-compatible endpoint.
//! Some hosted models return tool arguments as an object instead of a
//! string; the unifier accepts both.
//!
//! The `-Free` models carry no token pricing. A flat per-call fee, if the
//! account is billed one, comes from `providers.together.flat_cost_per_call`
//! in the configuration.

use backend_core::{GenerationParams, Message, ModelEntry, Result, ToolSpec};
use serde_json::Value;

use super::chat_completions;
use crate::backend::{ParsedReply, ProviderBackend, RequestContext, Translator};
use crate::transport::WireRequest;

/// Together backend
pub type TogetherBackend = ProviderBackend<TogetherTranslator>;

/// Pricing in USD per token
pub const MODELS: &[(&str, ModelEntry)] = &[
    (
        "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo",
        ModelEntry::new(131_072, 0.000_000_18, 0.000_000_18),
    ),
    (
        "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
        ModelEntry::new(131_072, 0.000_000_88, 0.000_000_88),
    ),
    (
        "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo",
        ModelEntry::new(130_815, 0.000_003_5, 0.000_003_5),
    ),
    (
        "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free",
        ModelEntry::free(131_072),
    ),
    (
        "mistralai/Mixtral-8x7B-Instruct-v0.1",
        ModelEntry::new(32_768, 0.000_000_6, 0.000_000_6),
    ),
    (
        "Qwen/Qwen2.5-72B-Instruct-Turbo",
        ModelEntry::new(32_768, 0.000_001_2, 0.000_001_2),
    ),
];

/// Together (OpenAI-compatible) dialect
#[derive(Debug)]
pub struct TogetherTranslator;

impl Translator for TogetherTranslator {
    const PROVIDER: &'static str = "together";
    const DEFAULT_BASE_URL: &'static str = "https://api.together.xyz/v1";
    const DEFAULTS: GenerationParams = GenerationParams {
        temperature: 0.7,
        max_tokens: 2048,
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
