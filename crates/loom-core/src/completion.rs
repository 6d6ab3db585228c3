use serde::{Deserialize, Serialize};

use crate::function::ChatFunctionCall;
use crate::model::ModelIdentifier;
use crate::prompt::{ChatMessage, PromptKind, PromptLiteral};

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndOfTurn,
    MaxTokens,
    StopSequence,
    FunctionCall,
    ContentFilter,
    /// Vendor reason with no common equivalent
    Other(String),
}

/// Continuation of a [`crate::prompt::TextPrompt`]
#[derive(Debug, Clone, PartialEq)]
pub struct TextCompletion {
    /// Prefix that was completed
    pub prefix: PromptLiteral,
    /// Generated continuation
    pub text: String,
    pub stop_reason: Option<StopReason>,
    /// Model that actually served the request
    pub model: Option<ModelIdentifier>,
}

/// Next assistant turn of a [`crate::prompt::ChatPrompt`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    /// Messages that were completed
    pub prompt: Vec<ChatMessage>,
    /// Assistant message; text may be empty when only functions were called
    pub message: ChatMessage,
    /// Calls the model wants the caller to invoke, in emission order
    pub function_calls: Vec<ChatFunctionCall>,
    pub stop_reason: Option<StopReason>,
    /// Model that actually served the request
    pub model: Option<ModelIdentifier>,
}

impl ChatCompletion {
    /// First function call, if any
    pub fn function_call(&self) -> Option<&ChatFunctionCall> {
        self.function_calls.first()
    }

    /// Assistant text, if the message carries any
    pub fn text(&self) -> Option<&str> {
        self.message.as_text()
    }
}

/// Completion of either prompt variant
#[derive(Debug, Clone, PartialEq)]
pub enum AnyCompletion {
    Text(TextCompletion),
    Chat(ChatCompletion),
}

impl AnyCompletion {
    pub const fn kind(&self) -> PromptKind {
        match self {
            Self::Text(_) => PromptKind::Text,
            Self::Chat(_) => PromptKind::Chat,
        }
    }

    pub fn into_text(self) -> Option<TextCompletion> {
        match self {
            Self::Text(completion) => Some(completion),
            Self::Chat(_) => None,
        }
    }

    pub fn into_chat(self) -> Option<ChatCompletion> {
        match self {
            Self::Chat(completion) => Some(completion),
            Self::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;

    #[test]
    fn function_call_accessor() {
        let call = ChatFunctionCall::new("lookup", Arguments::default());
        let completion = ChatCompletion {
            prompt: Vec::new(),
            message: ChatMessage::assistant(""),
            function_calls: vec![call.clone()],
            stop_reason: Some(StopReason::FunctionCall),
            model: None,
        };

        assert_eq!(completion.function_call(), Some(&call));
        assert_eq!(completion.text(), Some(""));
        assert_eq!(AnyCompletion::Chat(completion).kind(), PromptKind::Chat);
    }

    #[test]
    fn any_completion_unwraps_its_variant() {
        let text = AnyCompletion::Text(TextCompletion {
            prefix: PromptLiteral::new("Once"),
            text: " upon a time".to_owned(),
            stop_reason: None,
            model: None,
        });

        assert_eq!(text.kind(), PromptKind::Text);
        assert!(text.clone().into_chat().is_none());
        assert_eq!(text.into_text().unwrap().text, " upon a time");
    }

    #[test]
    fn stop_reason_serde() {
        assert_eq!(serde_json::to_string(&StopReason::EndOfTurn).unwrap(), "\"end_of_turn\"");
        let other: StopReason = serde_json::from_str(r#"{"other":"pause_turn"}"#).unwrap();
        assert_eq!(other, StopReason::Other("pause_turn".to_owned()));
    }
}
