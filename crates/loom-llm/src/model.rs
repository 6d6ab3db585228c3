//! Models known to each vendor adapter

use std::str::FromStr;

use loom_core::{LoomError, ModelIdentifier, ModelProvider, PromptKind, Result, VendorModel};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Models served by the `OpenAI` adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum OpenAiModel {
    #[strum(serialize = "gpt-4.1")]
    Gpt41,
    #[strum(serialize = "gpt-4.1-mini")]
    Gpt41Mini,
    #[strum(serialize = "gpt-4o")]
    Gpt4o,
    #[strum(serialize = "gpt-4o-mini")]
    Gpt4oMini,
    #[strum(serialize = "gpt-4-turbo")]
    Gpt4Turbo,
    #[strum(serialize = "gpt-4")]
    Gpt4,
    #[strum(serialize = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[strum(serialize = "o1")]
    O1,
    #[strum(serialize = "o3-mini")]
    O3Mini,
    /// Legacy completions only
    #[strum(serialize = "gpt-3.5-turbo-instruct")]
    Gpt35TurboInstruct,
    /// Legacy completions only
    #[strum(serialize = "davinci-002")]
    Davinci002,
    /// Legacy completions only
    #[strum(serialize = "babbage-002")]
    Babbage002,
}

impl OpenAiModel {
    /// Used for chat prompts when neither the prompt nor the config names a model
    pub const DEFAULT_CHAT: Self = Self::Gpt4oMini;
    /// Used for text prompts when neither the prompt nor the config names a model
    pub const DEFAULT_TEXT: Self = Self::Gpt35TurboInstruct;

    /// Whether the model is served by the endpoint for `kind`
    pub const fn supports(self, kind: PromptKind) -> bool {
        let legacy = matches!(self, Self::Gpt35TurboInstruct | Self::Davinci002 | Self::Babbage002);
        match kind {
            PromptKind::Text => legacy,
            PromptKind::Chat => !legacy,
        }
    }

    pub const fn default_for(kind: PromptKind) -> Self {
        match kind {
            PromptKind::Text => Self::DEFAULT_TEXT,
            PromptKind::Chat => Self::DEFAULT_CHAT,
        }
    }
}

impl VendorModel for OpenAiModel {
    fn provider() -> ModelProvider {
        ModelProvider::OpenAi
    }

    fn name(self) -> &'static str {
        self.into()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }
}

/// Models served by the Anthropic adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum AnthropicModel {
    #[strum(serialize = "claude-opus-4-0")]
    ClaudeOpus4,
    #[strum(serialize = "claude-sonnet-4-0")]
    ClaudeSonnet4,
    #[strum(serialize = "claude-3-7-sonnet-latest")]
    Claude37Sonnet,
    #[strum(serialize = "claude-3-5-sonnet-latest")]
    Claude35Sonnet,
    #[strum(serialize = "claude-3-5-haiku-latest")]
    Claude35Haiku,
    #[strum(serialize = "claude-3-opus-latest")]
    Claude3Opus,
    #[strum(serialize = "claude-3-haiku-20240307")]
    Claude3Haiku,
}

impl AnthropicModel {
    /// Used when neither the prompt nor the config names a model
    pub const DEFAULT: Self = Self::Claude35Haiku;

    /// Output ceiling sent as `max_tokens` for [`loom_core::TokenLimit::Max`]
    pub const fn max_output_tokens(self) -> u32 {
        match self {
            Self::ClaudeSonnet4 | Self::Claude37Sonnet => 64_000,
            Self::ClaudeOpus4 => 32_000,
            Self::Claude35Sonnet | Self::Claude35Haiku => 8_192,
            Self::Claude3Opus | Self::Claude3Haiku => 4_096,
        }
    }
}

impl VendorModel for AnthropicModel {
    fn provider() -> ModelProvider {
        ModelProvider::Anthropic
    }

    fn name(self) -> &'static str {
        self.into()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }
}

/// Parse a configured `default_model`
///
/// Accepts a bare model name or a full `provider/name` identifier.
pub fn parse_configured<M: VendorModel>(raw: &str) -> Result<M> {
    if raw.contains('/') {
        let identifier: ModelIdentifier = raw
            .parse()
            .map_err(|e| LoomError::InvalidRequest(format!("invalid default_model '{raw}': {e}")))?;
        return M::from_model_identifier(&identifier);
    }

    M::from_name(raw).ok_or_else(|| LoomError::UnexpectedModelName {
        identifier: ModelIdentifier::new(M::provider(), raw),
    })
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn names_round_trip() {
        for model in OpenAiModel::iter() {
            assert_eq!(OpenAiModel::from_name(model.name()), Some(model));
        }
        for model in AnthropicModel::iter() {
            assert_eq!(AnthropicModel::from_model_identifier(&model.model_identifier()).unwrap(), model);
        }
    }

    #[test]
    fn foreign_identifiers_are_illegal() {
        let providers = [
            ModelProvider::OpenAi,
            ModelProvider::Anthropic,
            ModelProvider::Google,
            ModelProvider::Mistral,
            ModelProvider::from("local"),
        ];

        for provider in providers {
            let identifier = ModelIdentifier::new(provider.clone(), "foo");
            if provider != ModelProvider::OpenAi {
                assert!(matches!(
                    OpenAiModel::from_model_identifier(&identifier),
                    Err(LoomError::IllegalModelIdentifier { .. })
                ));
            }
            if provider != ModelProvider::Anthropic {
                assert!(matches!(
                    AnthropicModel::from_model_identifier(&identifier),
                    Err(LoomError::IllegalModelIdentifier { .. })
                ));
            }
        }
    }

    #[test]
    fn endpoint_support() {
        assert!(OpenAiModel::DEFAULT_CHAT.supports(PromptKind::Chat));
        assert!(OpenAiModel::DEFAULT_TEXT.supports(PromptKind::Text));
        assert!(!OpenAiModel::Gpt4o.supports(PromptKind::Text));
    }

    #[test]
    fn configured_names() {
        assert_eq!(parse_configured::<OpenAiModel>("gpt-4o").unwrap(), OpenAiModel::Gpt4o);
        assert_eq!(
            parse_configured::<AnthropicModel>("anthropic/claude-sonnet-4-0").unwrap(),
            AnthropicModel::ClaudeSonnet4
        );
        assert!(matches!(
            parse_configured::<AnthropicModel>("openai/gpt-4o"),
            Err(LoomError::IllegalModelIdentifier { .. })
        ));
        assert!(matches!(
            parse_configured::<OpenAiModel>("gpt-5-ultra"),
            Err(LoomError::UnexpectedModelName { .. })
        ));
    }
}
