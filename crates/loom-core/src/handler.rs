//! Completion handler trait implemented by each vendor adapter

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::completion::{AnyCompletion, ChatCompletion, TextCompletion};
use crate::error::{LoomError, Result};
use crate::model::ModelProvider;
use crate::parameters::{AnyCompletionParameters, ChatCompletionParameters, TextCompletionParameters};
use crate::prompt::{AnyPrompt, ChatPrompt, Prompt, PromptKind, TextPrompt};

/// Prompt variants and features a handler services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerCapabilities {
    /// Handler completes text prompts
    pub text: bool,
    /// Handler completes chat prompts
    pub chat: bool,
    /// Handler forwards function definitions and returns function calls
    pub function_calling: bool,
}

impl HandlerCapabilities {
    pub const fn supports(&self, kind: PromptKind) -> bool {
        match kind {
            PromptKind::Text => self.text,
            PromptKind::Chat => self.chat,
        }
    }
}

/// Backend able to complete prompts
///
/// Both completion methods default to [`LoomError::UnsupportedPromptType`];
/// an adapter overrides the ones its vendor supports.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    /// Instance name, usually the config key
    fn name(&self) -> &str;

    /// Provider whose models this handler serves
    fn provider(&self) -> ModelProvider;

    /// Advertised capabilities
    fn capabilities(&self) -> HandlerCapabilities;

    /// Complete a text prompt
    async fn complete_text(
        &self,
        _prompt: &TextPrompt,
        _parameters: &TextCompletionParameters,
    ) -> Result<TextCompletion> {
        Err(LoomError::UnsupportedPromptType(PromptKind::Text))
    }

    /// Complete a chat prompt
    async fn complete_chat(
        &self,
        _prompt: &ChatPrompt,
        _parameters: &ChatCompletionParameters,
    ) -> Result<ChatCompletion> {
        Err(LoomError::UnsupportedPromptType(PromptKind::Chat))
    }
}

/// Typed entry points over any [`CompletionHandler`]
pub trait CompletionHandlerExt: CompletionHandler {
    /// Complete `prompt`; the parameter and completion types follow from `P`
    fn complete<'a, P: Prompt>(
        &'a self,
        prompt: &'a P,
        parameters: &'a P::Parameters,
    ) -> BoxFuture<'a, Result<P::Completion>> {
        prompt.complete_with(self, parameters)
    }

    /// Complete `prompt` with default parameters
    fn complete_default<'a, P: Prompt>(&'a self, prompt: &'a P) -> BoxFuture<'a, Result<P::Completion>> {
        Box::pin(async move {
            let parameters = P::Parameters::default();
            prompt.complete_with(self, &parameters).await
        })
    }

    /// Complete a runtime-selected prompt variant
    fn complete_any<'a>(
        &'a self,
        prompt: &'a AnyPrompt,
        parameters: &'a AnyCompletionParameters,
    ) -> BoxFuture<'a, Result<AnyCompletion>> {
        prompt.complete_with(self, parameters)
    }
}

impl<H: CompletionHandler + ?Sized> CompletionHandlerExt for H {}
