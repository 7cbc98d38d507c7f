//! Model Dispatch
//!
//! Process-wide map from model identifier to the provider serving it, built
//! once from the per-provider model tables. Model ids must be unique across
//! providers.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use backend_core::{Backend, BackendConfig, BackendError, Credential, ModelEntry, Result, ToolSpec};

use crate::backend::Translator;
use crate::providers::{
    AnthropicBackend, AnthropicTranslator, GeminiBackend, GeminiTranslator, OllamaBackend,
    OllamaTranslator, OpenAiBackend, OpenAiTranslator, TogetherBackend, TogetherTranslator,
};
use crate::transport::Transport;

/// Supported providers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Ollama,
    OpenAi,
    Anthropic,
    Together,
    Gemini,
}

impl ProviderKind {
    /// Every provider, in dispatch order
    pub const ALL: [Self; 5] = [
        Self::Ollama,
        Self::OpenAi,
        Self::Anthropic,
        Self::Together,
        Self::Gemini,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ollama => OllamaTranslator::PROVIDER,
            Self::OpenAi => OpenAiTranslator::PROVIDER,
            Self::Anthropic => AnthropicTranslator::PROVIDER,
            Self::Together => TogetherTranslator::PROVIDER,
            Self::Gemini => GeminiTranslator::PROVIDER,
        }
    }

    /// Model table of this provider
    pub fn models(self) -> &'static [(&'static str, ModelEntry)] {
        match self {
            Self::Ollama => OllamaTranslator::models(),
            Self::OpenAi => OpenAiTranslator::models(),
            Self::Anthropic => AnthropicTranslator::models(),
            Self::Together => TogetherTranslator::models(),
            Self::Gemini => GeminiTranslator::models(),
        }
    }

    /// Whether the provider refuses construction without a credential
    pub const fn requires_credential(self) -> bool {
        match self {
            Self::Ollama => OllamaTranslator::REQUIRES_CREDENTIAL,
            Self::OpenAi => OpenAiTranslator::REQUIRES_CREDENTIAL,
            Self::Anthropic => AnthropicTranslator::REQUIRES_CREDENTIAL,
            Self::Together => TogetherTranslator::REQUIRES_CREDENTIAL,
            Self::Gemini => GeminiTranslator::REQUIRES_CREDENTIAL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BackendError::Config(format!("unknown provider: {s}")))
    }
}

/// Model id → (provider, entry)
#[derive(Debug)]
pub struct ModelRegistry {
    models: HashMap<&'static str, (ProviderKind, ModelEntry)>,
}

impl ModelRegistry {
    fn build() -> Self {
        let mut models = HashMap::new();
        for kind in ProviderKind::ALL {
            for (id, entry) in kind.models() {
                if let Some((existing, _)) = models.insert(*id, (kind, *entry)) {
                    tracing::warn!(model = *id, first = %existing, second = %kind, "model id served by two providers");
                }
            }
        }
        Self { models }
    }

    /// Provider and pricing entry for a model
    pub fn lookup(&self, model: &str) -> Option<(ProviderKind, ModelEntry)> {
        self.models.get(model).copied()
    }

    /// Provider serving a model
    pub fn provider_for(&self, model: &str) -> Result<ProviderKind> {
        self.lookup(model)
            .map(|(kind, _)| kind)
            .ok_or_else(|| BackendError::unknown_model(model, "any"))
    }

    /// All registered model ids, sorted
    pub fn models(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.models.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

static REGISTRY: LazyLock<ModelRegistry> = LazyLock::new(ModelRegistry::build);

/// The process-wide model registry
pub fn registry() -> &'static ModelRegistry {
    &REGISTRY
}

/// Construct the backend serving `model`
///
/// Fails with `UnknownModel` when no provider lists the model.
pub fn create_backend(
    role: impl Into<String>,
    model: impl Into<String>,
    tools: &[ToolSpec],
    credential: Credential,
    config: &BackendConfig,
) -> Result<Box<dyn Backend>> {
    let model = model.into();
    let backend: Box<dyn Backend> = match registry().provider_for(&model)? {
        ProviderKind::Ollama => Box::new(OllamaBackend::new(role, model, tools, credential, config)?),
        ProviderKind::OpenAi => Box::new(OpenAiBackend::new(role, model, tools, credential, config)?),
        ProviderKind::Anthropic => {
            Box::new(AnthropicBackend::new(role, model, tools, credential, config)?)
        }
        ProviderKind::Together => {
            Box::new(TogetherBackend::new(role, model, tools, credential, config)?)
        }
        ProviderKind::Gemini => Box::new(GeminiBackend::new(role, model, tools, credential, config)?),
    };
    Ok(backend)
}

/// Construct the backend serving `model` over a caller-supplied transport
pub fn create_backend_with_transport(
    role: impl Into<String>,
    model: impl Into<String>,
    tools: &[ToolSpec],
    credential: Credential,
    config: &BackendConfig,
    transport: Arc<dyn Transport>,
) -> Result<Box<dyn Backend>> {
    let model = model.into();
    let backend: Box<dyn Backend> = match registry().provider_for(&model)? {
        ProviderKind::Ollama => Box::new(OllamaBackend::with_transport(
            role, model, tools, credential, config, transport,
        )?),
        ProviderKind::OpenAi => Box::new(OpenAiBackend::with_transport(
            role, model, tools, credential, config, transport,
        )?),
        ProviderKind::Anthropic => Box::new(AnthropicBackend::with_transport(
            role, model, tools, credential, config, transport,
        )?),
        ProviderKind::Together => Box::new(TogetherBackend::with_transport(
            role, model, tools, credential, config, transport,
        )?),
        ProviderKind::Gemini => Box::new(GeminiBackend::with_transport(
            role, model, tools, credential, config, transport,
        )?),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ids_are_unique() {
        let total: usize = ProviderKind::ALL.iter().map(|k| k.models().len()).sum();
        assert_eq!(registry().len(), total);
    }

    #[test]
    fn test_dispatch() {
        assert_eq!(registry().provider_for("llama3").unwrap(), ProviderKind::Ollama);
        assert_eq!(registry().provider_for("gpt-4o").unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            registry().provider_for("claude-3-haiku-20240307").unwrap(),
            ProviderKind::Anthropic
        );
        assert_eq!(
            registry().provider_for("mistralai/Mixtral-8x7B-Instruct-v0.1").unwrap(),
            ProviderKind::Together
        );
        assert_eq!(registry().provider_for("gemini-1.5-flash").unwrap(), ProviderKind::Gemini);
    }

    #[test]
    fn test_unknown_model() {
        let err = registry().provider_for("gpt-17").unwrap_err();
        assert!(matches!(err, BackendError::UnknownModel { ref model, .. } if model == "gpt-17"));

        let err = create_backend("planner", "gpt-17", &[], Credential::none(), &BackendConfig::new())
            .unwrap_err();
        assert!(matches!(err, BackendError::UnknownModel { .. }));
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!("bedrock".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::Together.to_string(), "together");
        assert!(!ProviderKind::Ollama.requires_credential());
        assert!(ProviderKind::Anthropic.requires_credential());
    }

    #[test]
    fn test_models_sorted() {
        let ids = registry().models();
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
        assert!(!registry().is_empty());
    }
}
