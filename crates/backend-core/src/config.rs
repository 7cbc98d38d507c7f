//! Backend Configuration
//!
//! Role-scoped generation parameters and per-provider connection settings.
//!
//! ```toml
//! [roles.planner]
//! temperature = 0.2
//! max_tokens = 1024
//!
//! [providers.ollama]
//! base_url = "http://gpu-box:11434"
//! timeout_secs = 300
//!
//! [providers.together]
//! flat_cost_per_call = 0.0
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BackendError, Result};

/// Generation parameters for one agent role
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Connection and billing settings for one provider
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Base URL override (provider default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Transport timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed charge added to every call, on top of token pricing
    #[serde(default)]
    pub flat_cost_per_call: f64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            flat_cost_per_call: 0.0,
        }
    }
}

impl ProviderSettings {
    pub fn validate(&self, provider: &str) -> Result<()> {
        if !self.flat_cost_per_call.is_finite() || self.flat_cost_per_call < 0.0 {
            return Err(BackendError::Config(format!(
                "{provider}: flat_cost_per_call must be a non-negative number"
            )));
        }
        if self.base_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            return Err(BackendError::Config(format!("{provider}: base_url is empty")));
        }
        if self.timeout_secs == 0 {
            return Err(BackendError::Config(format!("{provider}: timeout_secs must be positive")));
        }
        Ok(())
    }
}

/// Construction-time configuration shared by all backends
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Generation parameters keyed by agent role
    #[serde(default)]
    pub roles: HashMap<String, RoleParams>,

    /// Provider settings keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| BackendError::Config(e.to_string()))
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BackendError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;

        tracing::debug!(
            path = %path.display(),
            roles = config.roles.len(),
            providers = config.providers.len(),
            "loaded backend config"
        );
        Ok(config)
    }

    /// Look up a generation parameter for a role
    ///
    /// Known keys are `temperature` and `max_tokens`.
    pub fn param(&self, role: &str, key: &str) -> Option<f64> {
        let params = self.roles.get(role)?;
        match key {
            "temperature" => params.temperature,
            "max_tokens" => params.max_tokens.map(f64::from),
            _ => None,
        }
    }

    /// Settings for a provider, defaults when not configured
    pub fn provider(&self, name: &str) -> ProviderSettings {
        self.providers.get(name).cloned().unwrap_or_default()
    }

    pub fn with_role(mut self, role: impl Into<String>, params: RoleParams) -> Self {
        self.roles.insert(role.into(), params);
        self
    }

    pub fn with_provider(mut self, name: impl Into<String>, settings: ProviderSettings) -> Self {
        self.providers.insert(name.into(), settings);
        self
    }
}
