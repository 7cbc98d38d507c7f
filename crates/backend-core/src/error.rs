//! Error Types

use thiserror::Error;

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Backend error types
///
/// Construction-time variants (`UnknownModel`, `Config`) are returned to the
/// caller as `Err`. Per-call variants are never raised past
/// [`Backend::send`](crate::provider::Backend::send); they are folded into
/// the response payload instead.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Model identifier not present in the provider's registry
    #[error("Unknown model '{model}' for provider {provider}")]
    UnknownModel { model: String, provider: String },

    /// Invalid backend configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Conversation message violates the message invariants
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Network or SDK level failure during a provider call
    #[error("transport error from {provider}: {reason}")]
    Transport { provider: String, reason: String },

    /// Provider reply lacks a field the translator needs
    #[error("malformed reply from {provider}: {reason}")]
    MalformedReply { provider: String, reason: String },

}

impl BackendError {
    pub fn unknown_model(model: impl Into<String>, provider: impl Into<String>) -> Self {
        Self::UnknownModel {
            model: model.into(),
            provider: provider.into(),
        }
    }

    pub fn transport(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::Transport {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(provider: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedReply {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error belongs to a single `send` call rather than setup
    pub fn is_per_call(&self) -> bool {
        !matches!(self, Self::UnknownModel { .. } | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_text_names_provider() {
        let err = BackendError::transport("ollama", "connection refused");
        assert_eq!(err.to_string(), "transport error from ollama: connection refused");

        let err = BackendError::malformed("gemini", "missing `candidates`");
        assert!(err.to_string().starts_with("malformed reply from gemini"));
    }

    #[test]
    fn test_every_variant_is_classified() {
        let errors = [
            BackendError::unknown_model("gpt-0", "openai"),
            BackendError::Config("bad".into()),
            BackendError::InvalidMessage("empty".into()),
            BackendError::transport("ollama", "refused"),
            BackendError::malformed("gemini", "no candidates"),
        ];

        for err in errors {
            let setup = match &err {
                BackendError::UnknownModel { .. } | BackendError::Config(_) => true,
                BackendError::InvalidMessage(_)
                | BackendError::Transport { .. }
                | BackendError::MalformedReply { .. } => false,
            };
            assert_eq!(err.is_per_call(), !setup, "{err}");
        }
    }

    #[test]
    fn test_setup_errors_are_not_per_call() {
        assert!(!BackendError::unknown_model("gpt-0", "openai").is_per_call());
        assert!(!BackendError::Config("bad".into()).is_per_call());
        assert!(BackendError::transport("openai", "timeout").is_per_call());
    }
}
