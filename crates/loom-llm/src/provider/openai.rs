//! `OpenAI` adapter: chat completions plus the legacy text completions endpoint

use async_trait::async_trait;
use loom_config::LlmProviderConfig;
use loom_core::{
    ChatCompletion, ChatCompletionParameters, ChatPrompt, CompletionHandler, HandlerCapabilities, LoomError,
    ModelProvider, PromptContextValues, PromptKind, Result, TextCompletion, TextCompletionParameters, TextPrompt,
    resolve_model,
};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::convert;
use crate::model::{OpenAiModel, parse_configured};
use crate::protocol::openai::{OpenAiChatResponse, OpenAiCompletionResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Adapter for the `OpenAI` HTTP API
pub struct OpenAiAdapter {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    default_model: Option<OpenAiModel>,
}

impl OpenAiAdapter {
    /// Create from adapter configuration
    ///
    /// # Errors
    ///
    /// `UnexpectedModelName` or `IllegalModelIdentifier` for a bad
    /// `default_model`, `Internal` if the HTTP client cannot be built.
    pub fn new(name: &str, config: &LlmProviderConfig) -> Result<Self> {
        let default_model = config
            .default_model
            .as_deref()
            .map(parse_configured::<OpenAiModel>)
            .transpose()?;

        Ok(Self {
            name: name.to_owned(),
            client: super::http_client(config)?,
            base_url: super::base_url(config, DEFAULT_BASE_URL)?,
            api_key: config.api_key.clone(),
            default_model,
        })
    }

    /// Model for a prompt of `kind`
    ///
    /// The prompt's identifier wins, then the configured default if it serves
    /// `kind`, then [`OpenAiModel::default_for`].
    fn model_for(&self, context: &PromptContextValues, kind: PromptKind) -> Result<OpenAiModel> {
        let fallback = self
            .default_model
            .filter(|model| model.supports(kind))
            .unwrap_or_else(|| OpenAiModel::default_for(kind));

        let model = resolve_model(context, fallback)?;
        if !model.supports(kind) {
            return Err(LoomError::InvalidRequest(format!(
                "model {model} does not serve {kind} prompts"
            )));
        }
        Ok(model)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let builder = self.client.post(super::endpoint(&self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }
}

#[async_trait]
impl CompletionHandler for OpenAiAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn provider(&self) -> ModelProvider {
        ModelProvider::OpenAi
    }

    fn capabilities(&self) -> HandlerCapabilities {
        HandlerCapabilities {
            text: true,
            chat: true,
            function_calling: true,
        }
    }

    async fn complete_text(
        &self,
        prompt: &TextPrompt,
        parameters: &TextCompletionParameters,
    ) -> Result<TextCompletion> {
        let model = self.model_for(&prompt.context, PromptKind::Text)?;
        let request = convert::openai::text_request(model, prompt, parameters)?;

        tracing::debug!(provider = %self.name, model = %model, "sending text completion");
        let response: OpenAiCompletionResponse =
            super::send_json(&self.name, self.post("completions").json(&request)).await?;

        convert::openai::text_completion(response, prompt)
    }

    async fn complete_chat(
        &self,
        prompt: &ChatPrompt,
        parameters: &ChatCompletionParameters,
    ) -> Result<ChatCompletion> {
        let functions = convert::offered_functions(prompt, parameters)?;
        let model = self.model_for(&prompt.context, PromptKind::Chat)?;
        let request = convert::openai::chat_request(model, prompt, parameters, &functions)?;

        tracing::debug!(
            provider = %self.name,
            model = %model,
            messages = request.messages.len(),
            functions = functions.len(),
            "sending chat completion"
        );
        let response: OpenAiChatResponse =
            super::send_json(&self.name, self.post("chat/completions").json(&request)).await?;

        convert::openai::chat_completion(response, prompt, &functions)
    }
}
