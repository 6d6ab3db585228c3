use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Completion adapters and how to pick one
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Adapter used when a prompt does not name a model
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Adapter configurations keyed by name, in file order
    #[serde(default)]
    pub providers: IndexMap<String, LlmProviderConfig>,
}

impl LlmConfig {
    /// Name and config of the default adapter
    ///
    /// Falls back to the first configured adapter when no default is named.
    pub fn default_provider(&self) -> Option<(&str, &LlmProviderConfig)> {
        match &self.default_provider {
            Some(name) => self
                .providers
                .get_key_value(name)
                .map(|(name, config)| (name.as_str(), config)),
            None => self.providers.first().map(|(name, config)| (name.as_str(), config)),
        }
    }
}

/// One vendor adapter
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmProviderConfig {
    /// Wire protocol the adapter speaks
    #[serde(rename = "type")]
    pub provider_type: LlmProviderType,
    /// API key sent with every request
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Override of the vendor's public endpoint
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model used when the prompt names none
    #[serde(default)]
    pub default_model: Option<String>,
    /// Per-request timeout (e.g. "30s", "2m")
    #[serde(default)]
    pub timeout: Option<String>,
}

impl LlmProviderConfig {
    /// Parsed request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `timeout` is not a valid duration
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| duration_str::parse(raw).map_err(|e| anyhow::anyhow!("invalid timeout '{raw}': {e}")))
            .transpose()
    }
}

/// Supported vendor protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderType {
    /// `OpenAI` chat and legacy completions API
    Openai,
    /// Anthropic Messages API
    Anthropic,
}

impl LlmProviderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}
