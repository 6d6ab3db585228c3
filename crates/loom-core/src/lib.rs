//! Vendor-neutral prompt and completion abstraction for Loom
//!
//! Defines text and chat prompts, the parameters and completions paired with
//! each, function definitions and calls, and the [`CompletionHandler`] trait
//! that vendor adapters implement.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod arguments;
pub mod completion;
pub mod context;
pub mod error;
pub mod function;
pub mod handler;
pub mod invocation;
pub mod model;
pub mod parameters;
pub mod prompt;

pub use arguments::{Arguments, KeyConvention};
pub use completion::{AnyCompletion, ChatCompletion, StopReason, TextCompletion};
pub use context::{
    FunctionCallIdKey, FunctionsKey, ModelIdentifierKey, PromptContextKey, PromptContextValues, ProviderMetadataKey,
};
pub use error::{ErrorCategory, LoomError, Result};
pub use function::{
    ChatFunctionCall, ChatFunctionDefinition, ChatFunctionId, FunctionName, FunctionResult, JsonSchema,
    ResultOfFunctionCall, ensure_unique_names,
};
pub use handler::{CompletionHandler, CompletionHandlerExt, HandlerCapabilities};
pub use invocation::{FunctionInvoker, invoke_all, match_results};
pub use model::{ModelIdentifier, ModelProvider, ProviderTag, VendorModel, resolve_model};
pub use parameters::{
    AnyCompletionParameters, ChatCompletionParameters, Sampling, TextCompletionParameters, TokenLimit,
};
pub use prompt::{
    AnyPrompt, ChatMessage, ChatMessageBody, ChatPrompt, ChatRole, Prompt, PromptKind, PromptLiteral, TextPrompt,
};
