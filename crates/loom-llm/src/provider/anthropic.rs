//! Anthropic adapter: chat prompts over the Messages API

use async_trait::async_trait;
use loom_config::LlmProviderConfig;
use loom_core::{
    ChatCompletion, ChatCompletionParameters, ChatPrompt, CompletionHandler, HandlerCapabilities, ModelProvider,
    Result, resolve_model,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::convert;
use crate::model::{AnthropicModel, parse_configured};
use crate::protocol::anthropic::AnthropicResponse;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Value of the `anthropic-version` header
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Adapter for the Anthropic Messages API
///
/// Text prompts are not supported and fail with
/// [`loom_core::LoomError::UnsupportedPromptType`].
pub struct AnthropicAdapter {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    default_model: AnthropicModel,
}

impl AnthropicAdapter {
    /// Create from adapter configuration
    ///
    /// # Errors
    ///
    /// `UnexpectedModelName` or `IllegalModelIdentifier` for a bad
    /// `default_model`, `Internal` if the HTTP client cannot be built.
    pub fn new(name: &str, config: &LlmProviderConfig) -> Result<Self> {
        let default_model = match config.default_model.as_deref() {
            Some(raw) => parse_configured(raw)?,
            None => AnthropicModel::DEFAULT,
        };

        Ok(Self {
            name: name.to_owned(),
            client: super::http_client(config)?,
            base_url: super::base_url(config, DEFAULT_BASE_URL)?,
            api_key: config.api_key.clone(),
            default_model,
        })
    }
}

#[async_trait]
impl CompletionHandler for AnthropicAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider(&self) -> ModelProvider {
        ModelProvider::Anthropic
    }

    fn capabilities(&self) -> HandlerCapabilities {
        HandlerCapabilities {
            text: false,
            chat: true,
            function_calling: true,
        }
    }

    async fn complete_chat(
        &self,
        prompt: &ChatPrompt,
        parameters: &ChatCompletionParameters,
    ) -> Result<ChatCompletion> {
        let functions = convert::offered_functions(prompt, parameters)?;
        let model = resolve_model(&prompt.context, self.default_model)?;
        let request = convert::anthropic::chat_request(model, prompt, parameters, &functions)?;

        tracing::debug!(
            provider = %self.name,
            model = %model,
            messages = request.messages.len(),
            functions = functions.len(),
            "sending messages request"
        );

        let mut builder = self
            .client
            .post(super::endpoint(&self.base_url, "messages"))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key.expose_secret());
        }

        let response: AnthropicResponse = super::send_json(&self.name, builder).await?;
        convert::anthropic::chat_completion(response, prompt, &functions)
    }
}
