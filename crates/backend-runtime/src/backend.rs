//! Provider Backend
//!
//! One generic `Backend` implementation shared by every provider. The
//! provider-specific parts (schema dialect, wire messages, reply parsing)
//! come from a [`Translator`]; everything else lives here once: model
//! validation, parameter resolution, the single transport call, response
//! unification and pricing.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use backend_core::{
    Backend, BackendConfig, BackendError, BackendResponse, Credential, GenerationParams, Message,
    ModelEntry, Result, TokenUsage, ToolCall, ToolSpec, message::validate_conversation,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::transport::{HttpTransport, Transport, WireRequest};

/// Everything a translator needs to build one request
#[derive(Debug)]
pub struct RequestContext<'a> {
    pub model: &'a str,
    pub params: &'a GenerationParams,
    /// Tool declarations in the provider dialect, `None` without tools
    pub tools: Option<&'a Value>,
    pub base_url: &'a str,
    pub credential: &'a Credential,
}

/// A tool invocation as the provider reported it
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedToolCall {
    /// Provider-assigned id, if any
    pub id: Option<String>,
    pub name: String,
    /// Arguments, either a JSON object or a JSON-encoded string
    pub arguments: Value,
}

/// A provider reply reduced to the parts the unifier needs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ParsedToolCall>,
    pub usage: Option<TokenUsage>,
}

/// Provider-specific translation between the generic model and a wire format
pub trait Translator: Send + Sync + 'static {
    /// Provider name used in registries, config keys and error text
    const PROVIDER: &'static str;

    /// Base URL when none is configured
    const DEFAULT_BASE_URL: &'static str;

    /// Generation parameters when the role has none configured
    const DEFAULTS: GenerationParams;

    /// Whether calls need a credential
    const REQUIRES_CREDENTIAL: bool = true;

    /// Models served by this provider
    fn models() -> &'static [(&'static str, ModelEntry)];

    /// Translate tool specs into the provider's declaration dialect
    fn tool_declarations(tools: &[ToolSpec]) -> Option<Value>;

    /// Build the wire request for a conversation
    fn build_request(ctx: &RequestContext<'_>, conversation: &[Message]) -> Result<WireRequest>;

    /// Reduce a raw reply to content, tool calls and usage
    fn parse_reply(reply: &Value) -> Result<ParsedReply>;

    /// Base URL from the environment, consulted before the default
    fn base_url_from_env() -> Option<String> {
        None
    }

    /// Look up a model in this provider's table
    fn lookup(model: &str) -> Option<ModelEntry> {
        Self::models()
            .iter()
            .find(|(id, _)| *id == model)
            .map(|(_, entry)| *entry)
    }
}

/// Backend for one provider, parameterized by its translator
pub struct ProviderBackend<T: Translator> {
    role: String,
    model: String,
    entry: ModelEntry,
    params: GenerationParams,
    tools: Option<Value>,
    credential: Credential,
    base_url: String,
    flat_cost_per_call: f64,
    transport: Arc<dyn Transport>,
    _translator: PhantomData<fn() -> T>,
}

impl<T: Translator> std::fmt::Debug for ProviderBackend<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBackend")
            .field("provider", &T::PROVIDER)
            .field("role", &self.role)
            .field("model", &self.model)
            .field("params", &self.params)
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl<T: Translator> ProviderBackend<T> {
    /// Create a backend talking HTTP to the provider
    pub fn new(
        role: impl Into<String>,
        model: impl Into<String>,
        tools: &[ToolSpec],
        credential: Credential,
        config: &BackendConfig,
    ) -> Result<Self> {
        let model = model.into();
        if T::lookup(&model).is_none() {
            return Err(BackendError::unknown_model(&model, T::PROVIDER));
        }

        // Settings are validated by `with_transport`.
        let transport = Arc::new(HttpTransport::new(config.provider(T::PROVIDER).timeout_secs)?);
        Self::with_transport(role, model, tools, credential, config, transport)
    }

    /// Create a backend over a caller-supplied transport
    pub fn with_transport(
        role: impl Into<String>,
        model: impl Into<String>,
        tools: &[ToolSpec],
        credential: Credential,
        config: &BackendConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let role = role.into();
        let model = model.into();

        let entry = T::lookup(&model).ok_or_else(|| BackendError::unknown_model(&model, T::PROVIDER))?;

        let settings = config.provider(T::PROVIDER);
        settings.validate(T::PROVIDER)?;

        if T::REQUIRES_CREDENTIAL && credential.expose().is_none_or(str::is_empty) {
            return Err(BackendError::Config(format!("{} requires a credential", T::PROVIDER)));
        }

        let base_url = settings
            .base_url
            .or_else(T::base_url_from_env)
            .unwrap_or_else(|| T::DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let params = GenerationParams::resolve(config, &role, T::DEFAULTS);

        tracing::debug!(
            provider = T::PROVIDER,
            model = %model,
            role = %role,
            tools = tools.len(),
            "constructed backend"
        );

        Ok(Self {
            role,
            model,
            entry,
            params,
            tools: T::tool_declarations(tools),
            credential,
            base_url,
            flat_cost_per_call: settings.flat_cost_per_call,
            transport,
            _translator: PhantomData,
        })
    }

    /// Registry entry of the active model
    pub const fn entry(&self) -> &ModelEntry {
        &self.entry
    }

    /// Cached tool declarations in the provider dialect
    pub const fn tool_declarations(&self) -> Option<&Value> {
        self.tools.as_ref()
    }

    /// Base URL requests go to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the wire request without sending it
    pub fn build_request(&self, conversation: &[Message]) -> Result<WireRequest> {
        validate_conversation(conversation)?;
        let ctx = RequestContext {
            model: &self.model,
            params: &self.params,
            tools: self.tools.as_ref(),
            base_url: &self.base_url,
            credential: &self.credential,
        };
        T::build_request(&ctx, conversation)
    }

    async fn call(&self, conversation: &[Message]) -> Result<BackendResponse> {
        let request = self.build_request(conversation)?;

        tracing::debug!(
            provider = T::PROVIDER,
            model = %self.model,
            role = %self.role,
            url = %request.url,
            messages = conversation.len(),
            "sending backend request"
        );

        let reply = self.transport.post_json(&request).await?;
        let parsed = T::parse_reply(&reply)?;
        self.unify(parsed)
    }

    /// Turn a parsed reply into the uniform response shape
    fn unify(&self, parsed: ParsedReply) -> Result<BackendResponse> {
        let cost = parsed.usage.map_or(0.0, |usage| self.entry.cost(&usage)) + self.flat_cost_per_call;

        let mut calls = parsed.tool_calls.into_iter();
        let Some(first) = calls.next() else {
            return Ok(BackendResponse::from_content(
                parsed.content.unwrap_or_default(),
                cost,
            ));
        };

        let dropped: Vec<String> = calls.map(|c| c.name).collect();
        if !dropped.is_empty() {
            tracing::warn!(
                provider = T::PROVIDER,
                model = %self.model,
                surfaced = %first.name,
                dropped = dropped.len(),
                dropped_tools = ?dropped,
                "reply requested several tool calls; only the first is surfaced"
            );
        }

        if let Some(text) = parsed.content.as_deref().filter(|t| !t.trim().is_empty()) {
            tracing::debug!(provider = T::PROVIDER, text = %text, "text accompanying tool call not surfaced");
        }

        let arguments = decode_arguments(T::PROVIDER, &first.name, first.arguments)?;
        let id = first
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(synthesize_call_id);

        Ok(BackendResponse::from_tool_call(
            ToolCall::new(id, first.name, arguments),
            cost,
        ))
    }
}

#[async_trait]
impl<T: Translator> Backend for ProviderBackend<T> {
    fn provider(&self) -> &'static str {
        T::PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn role(&self) -> &str {
        &self.role
    }

    fn params(&self) -> &GenerationParams {
        &self.params
    }

    async fn send(&self, conversation: &[Message]) -> BackendResponse {
        match self.call(conversation).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    provider = T::PROVIDER,
                    model = %self.model,
                    role = %self.role,
                    error = %err,
                    "backend call failed"
                );
                BackendResponse::failed(&err)
            }
        }
    }
}

/// Fresh tool call id for providers that supply none
pub fn synthesize_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

/// Normalize tool arguments to a JSON object
///
/// Accepts an object, a JSON-encoded object string, or nothing.
pub fn decode_arguments(provider: &str, tool: &str, arguments: Value) -> Result<Map<String, Value>> {
    match arguments {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::String(raw) if raw.trim().is_empty() => Ok(Map::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(BackendError::malformed(
                provider,
                format!("arguments of tool `{tool}` are not an object: {other}"),
            )),
            Err(e) => Err(BackendError::malformed(
                provider,
                format!("invalid JSON in arguments of tool `{tool}`: {e}"),
            )),
        },
        other => Err(BackendError::malformed(
            provider,
            format!("arguments of tool `{tool}` are not an object: {other}"),
        )),
    }
}
