//! Prompts and the pairing between a prompt, its parameters and its
//! completion
//!
//! Each prompt type fixes its parameter and completion types through
//! [`Prompt`], so a text prompt can only be completed with text parameters
//! into a text completion. [`AnyPrompt`] covers callers that pick the variant
//! at runtime; there the pairing is checked and a mismatch is an error.

use std::fmt;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::completion::{AnyCompletion, ChatCompletion, TextCompletion};
use crate::context::{FunctionsKey, ModelIdentifierKey, PromptContextValues};
use crate::error::{LoomError, Result};
use crate::function::{ChatFunctionCall, ChatFunctionDefinition, ResultOfFunctionCall};
use crate::handler::CompletionHandler;
use crate::invocation::match_results;
use crate::model::ModelIdentifier;
use crate::parameters::{AnyCompletionParameters, ChatCompletionParameters, TextCompletionParameters};

/// Prompt variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Text,
    Chat,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Chat => "chat",
        })
    }
}

/// A prompt with its associated parameter and completion types
pub trait Prompt: Clone + Send + Sync + 'static {
    /// Parameters accepted when completing this prompt
    type Parameters: Default + Clone + Send + Sync + 'static;
    /// Completion produced for this prompt
    type Completion: Send + 'static;

    /// Variant tag
    const KIND: PromptKind;

    /// Side-channel values
    fn context(&self) -> &PromptContextValues;

    /// Route this prompt to the handler method for its variant
    fn complete_with<'a, H>(
        &'a self,
        handler: &'a H,
        parameters: &'a Self::Parameters,
    ) -> BoxFuture<'a, Result<Self::Completion>>
    where
        H: CompletionHandler + ?Sized;
}

/// Text a prompt is built from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PromptLiteral(String);

impl PromptLiteral {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PromptLiteral {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for PromptLiteral {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Flat text prompt completed by continuation
#[derive(Debug, Clone)]
pub struct TextPrompt {
    pub prefix: PromptLiteral,
    pub context: PromptContextValues,
}

impl TextPrompt {
    pub fn new(prefix: impl Into<PromptLiteral>) -> Self {
        Self {
            prefix: prefix.into(),
            context: PromptContextValues::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: PromptContextValues) -> Self {
        self.context = context;
        self
    }

    /// Pin the model this prompt runs on
    #[must_use]
    pub fn with_model(mut self, model: ModelIdentifier) -> Self {
        self.context.insert::<ModelIdentifierKey>(model);
        self
    }
}

impl Prompt for TextPrompt {
    type Parameters = TextCompletionParameters;
    type Completion = TextCompletion;

    const KIND: PromptKind = PromptKind::Text;

    fn context(&self) -> &PromptContextValues {
        &self.context
    }

    fn complete_with<'a, H>(
        &'a self,
        handler: &'a H,
        parameters: &'a TextCompletionParameters,
    ) -> BoxFuture<'a, Result<TextCompletion>>
    where
        H: CompletionHandler + ?Sized,
    {
        handler.complete_text(self, parameters)
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatRole {
    System,
    User,
    Assistant,
    /// Output of a function invocation
    Function,
}

impl ChatRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a chat message carries
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessageBody {
    Text(String),
    /// Call emitted by the assistant
    FunctionCall(ChatFunctionCall),
    /// Answer to a call, supplied by the caller
    FunctionResult(ResultOfFunctionCall),
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub body: ChatMessageBody,
}

impl ChatMessage {
    pub fn text(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            body: ChatMessageBody::Text(text.into()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::text(ChatRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(ChatRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(ChatRole::Assistant, text)
    }

    pub const fn function_call(call: ChatFunctionCall) -> Self {
        Self {
            role: ChatRole::Assistant,
            body: ChatMessageBody::FunctionCall(call),
        }
    }

    pub const fn function_result(result: ResultOfFunctionCall) -> Self {
        Self {
            role: ChatRole::Function,
            body: ChatMessageBody::FunctionResult(result),
        }
    }

    /// Text content, if this is a text message
    pub fn as_text(&self) -> Option<&str> {
        match &self.body {
            ChatMessageBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Ordered conversation completed by the next assistant turn
#[derive(Debug, Clone, Default)]
pub struct ChatPrompt {
    pub messages: Vec<ChatMessage>,
    pub context: PromptContextValues,
}

impl ChatPrompt {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            context: PromptContextValues::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: PromptContextValues) -> Self {
        self.context = context;
        self
    }

    /// Pin the model this prompt runs on
    #[must_use]
    pub fn with_model(mut self, model: ModelIdentifier) -> Self {
        self.context.insert::<ModelIdentifierKey>(model);
        self
    }

    /// Expose functions to the model
    #[must_use]
    pub fn with_functions(mut self, functions: Vec<ChatFunctionDefinition>) -> Self {
        self.context.insert::<FunctionsKey>(functions);
        self
    }

    /// Functions attached to the prompt context
    pub fn functions(&self) -> &[ChatFunctionDefinition] {
        self.context.get::<FunctionsKey>().map_or(&[], Vec::as_slice)
    }

    /// New prompt with `message` appended
    #[must_use]
    pub fn appending(&self, message: ChatMessage) -> Self {
        let mut next = self.clone();
        next.messages.push(message);
        next
    }

    /// Fold a completion and the caller's function results into the next turn
    ///
    /// Appends the assistant text (if any), each function call, then each
    /// result in the order of the calls it answers. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Propagates [`match_results`] failures. `InvalidRequest` if any call
    /// is left without a result.
    pub fn appending_turn(&self, completion: &ChatCompletion, results: &[ResultOfFunctionCall]) -> Result<Self> {
        let pairs = match_results(&completion.function_calls, results)?;
        let unanswered = completion
            .function_calls
            .iter()
            .find(|call| !pairs.iter().any(|(answered, _)| std::ptr::eq(*answered, *call)));
        if let Some(unanswered) = unanswered {
            return Err(LoomError::InvalidRequest(format!(
                "function call {} has no result",
                unanswered.name
            )));
        }

        let mut next = self.clone();
        let has_text = completion.message.as_text().is_some_and(|text| !text.is_empty());
        if has_text || completion.function_calls.is_empty() {
            next.messages.push(completion.message.clone());
        }
        next.messages.extend(
            completion
                .function_calls
                .iter()
                .cloned()
                .map(ChatMessage::function_call),
        );
        next.messages.extend(
            pairs
                .into_iter()
                .map(|(_, result)| ChatMessage::function_result(result.clone())),
        );

        Ok(next)
    }
}

impl Prompt for ChatPrompt {
    type Parameters = ChatCompletionParameters;
    type Completion = ChatCompletion;

    const KIND: PromptKind = PromptKind::Chat;

    fn context(&self) -> &PromptContextValues {
        &self.context
    }

    fn complete_with<'a, H>(
        &'a self,
        handler: &'a H,
        parameters: &'a ChatCompletionParameters,
    ) -> BoxFuture<'a, Result<ChatCompletion>>
    where
        H: CompletionHandler + ?Sized,
    {
        handler.complete_chat(self, parameters)
    }
}

/// Prompt of either variant, for runtime dispatch
#[derive(Debug, Clone)]
pub enum AnyPrompt {
    Text(TextPrompt),
    Chat(ChatPrompt),
}

impl AnyPrompt {
    pub const fn kind(&self) -> PromptKind {
        match self {
            Self::Text(_) => PromptKind::Text,
            Self::Chat(_) => PromptKind::Chat,
        }
    }

    pub const fn context(&self) -> &PromptContextValues {
        match self {
            Self::Text(prompt) => &prompt.context,
            Self::Chat(prompt) => &prompt.context,
        }
    }

    /// Complete with parameters of the matching variant
    ///
    /// # Errors
    ///
    /// `ParameterMismatch` if `parameters` belong to the other variant,
    /// otherwise whatever the handler returns.
    pub fn complete_with<'a, H>(
        &'a self,
        handler: &'a H,
        parameters: &'a AnyCompletionParameters,
    ) -> BoxFuture<'a, Result<AnyCompletion>>
    where
        H: CompletionHandler + ?Sized,
    {
        match (self, parameters) {
            (Self::Text(prompt), AnyCompletionParameters::Text(parameters)) => {
                prompt.complete_with(handler, parameters).map(|r| r.map(AnyCompletion::Text)).boxed()
            }
            (Self::Chat(prompt), AnyCompletionParameters::Chat(parameters)) => {
                prompt.complete_with(handler, parameters).map(|r| r.map(AnyCompletion::Chat)).boxed()
            }
            (prompt, parameters) => {
                let err = LoomError::ParameterMismatch {
                    prompt: prompt.kind(),
                    parameters: parameters.kind(),
                };
                futures_util::future::ready(Err(err)).boxed()
            }
        }
    }
}

impl From<TextPrompt> for AnyPrompt {
    fn from(prompt: TextPrompt) -> Self {
        Self::Text(prompt)
    }
}

impl From<ChatPrompt> for AnyPrompt {
    fn from(prompt: ChatPrompt) -> Self {
        Self::Chat(prompt)
    }
}
