//! Programmatic configuration builder for integration tests

use loom_config::{Config, LlmConfig, LlmProviderConfig, LlmProviderType};
use secrecy::SecretString;

/// API key the mock vendor accepts
pub const TEST_KEY: &str = "test-key";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config {
                llm: LlmConfig::default(),
                telemetry: None,
            },
        }
    }

    /// Add an `OpenAI` adapter pointed at a mock backend
    pub fn with_openai_provider(self, name: &str, base_url: &str) -> Self {
        self.with_provider(name, LlmProviderType::Openai, base_url, TEST_KEY)
    }

    /// Add an Anthropic adapter pointed at a mock backend
    pub fn with_anthropic_provider(self, name: &str, base_url: &str) -> Self {
        self.with_provider(name, LlmProviderType::Anthropic, base_url, TEST_KEY)
    }

    /// Add an adapter with an explicit API key
    pub fn with_provider(mut self, name: &str, provider_type: LlmProviderType, base_url: &str, api_key: &str) -> Self {
        self.config.llm.providers.insert(
            name.to_owned(),
            LlmProviderConfig {
                provider_type,
                api_key: Some(SecretString::from(api_key)),
                base_url: Some(base_url.parse().expect("valid URL")),
                default_model: None,
                timeout: Some("5s".to_owned()),
            },
        );
        self
    }

    /// Name the adapter used for prompts without a model
    pub fn with_default_provider(mut self, name: &str) -> Self {
        self.config.llm.default_provider = Some(name.to_owned());
        self
    }

    pub fn build(self) -> Config {
        self.config.validate().expect("valid test config");
        self.config
    }
}
