use crate::function::ChatFunctionDefinition;
use crate::prompt::PromptKind;

/// Upper bound on generated tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenLimit {
    /// At most this many tokens
    Fixed(u32),
    /// Whatever the model allows
    #[default]
    Max,
}

impl TokenLimit {
    /// The fixed limit, if any
    pub const fn fixed(self) -> Option<u32> {
        match self {
            Self::Fixed(limit) => Some(limit),
            Self::Max => None,
        }
    }
}

/// Sampling strategy; vendors accept one or the other
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampling {
    /// Sampling temperature
    Temperature(f64),
    /// Nucleus sampling threshold
    TopP(f64),
}

impl Sampling {
    pub const fn temperature(self) -> Option<f64> {
        match self {
            Self::Temperature(value) => Some(value),
            Self::TopP(_) => None,
        }
    }

    pub const fn top_p(self) -> Option<f64> {
        match self {
            Self::TopP(value) => Some(value),
            Self::Temperature(_) => None,
        }
    }
}

/// Parameters for completing a text prompt
///
/// The default leaves the token limit at [`TokenLimit::Max`] and sampling
/// unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextCompletionParameters {
    pub token_limit: TokenLimit,
    pub sampling: Option<Sampling>,
    pub stops: Vec<String>,
}

impl TextCompletionParameters {
    #[must_use]
    pub const fn with_token_limit(mut self, token_limit: TokenLimit) -> Self {
        self.token_limit = token_limit;
        self
    }

    #[must_use]
    pub const fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = Some(sampling);
        self
    }

    #[must_use]
    pub fn with_stops<I, S>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stops = stops.into_iter().map(Into::into).collect();
        self
    }
}

/// Parameters for completing a chat prompt
///
/// Functions listed here are offered to the model in addition to those
/// attached to the prompt context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatCompletionParameters {
    pub token_limit: TokenLimit,
    pub sampling: Option<Sampling>,
    pub stops: Vec<String>,
    pub functions: Vec<ChatFunctionDefinition>,
}

impl ChatCompletionParameters {
    #[must_use]
    pub const fn with_token_limit(mut self, token_limit: TokenLimit) -> Self {
        self.token_limit = token_limit;
        self
    }

    #[must_use]
    pub const fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = Some(sampling);
        self
    }

    #[must_use]
    pub fn with_stops<I, S>(mut self, stops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stops = stops.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_functions(mut self, functions: Vec<ChatFunctionDefinition>) -> Self {
        self.functions = functions;
        self
    }
}

/// Parameters of either prompt variant, for runtime dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum AnyCompletionParameters {
    Text(TextCompletionParameters),
    Chat(ChatCompletionParameters),
}

impl AnyCompletionParameters {
    /// Default parameters for a prompt variant
    pub fn default_for(kind: PromptKind) -> Self {
        match kind {
            PromptKind::Text => Self::Text(TextCompletionParameters::default()),
            PromptKind::Chat => Self::Chat(ChatCompletionParameters::default()),
        }
    }

    pub const fn kind(&self) -> PromptKind {
        match self {
            Self::Text(_) => PromptKind::Text,
            Self::Chat(_) => PromptKind::Chat,
        }
    }
}

impl From<TextCompletionParameters> for AnyCompletionParameters {
    fn from(parameters: TextCompletionParameters) -> Self {
        Self::Text(parameters)
    }
}

impl From<ChatCompletionParameters> for AnyCompletionParameters {
    fn from(parameters: ChatCompletionParameters) -> Self {
        Self::Chat(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_max_and_unset_sampling() {
        let text = TextCompletionParameters::default();
        assert_eq!(text.token_limit, TokenLimit::Max);
        assert!(text.sampling.is_none());
        assert!(text.stops.is_empty());

        let chat = ChatCompletionParameters::default();
        assert_eq!(chat.token_limit, TokenLimit::Max);
        assert!(chat.sampling.is_none());
        assert!(chat.functions.is_empty());
    }

    #[test]
    fn sampling_accessors() {
        assert_eq!(Sampling::Temperature(0.2).temperature(), Some(0.2));
        assert_eq!(Sampling::Temperature(0.2).top_p(), None);
        assert_eq!(Sampling::TopP(0.9).top_p(), Some(0.9));
    }

    #[test]
    fn builders() {
        let params = TextCompletionParameters::default()
            .with_token_limit(TokenLimit::Fixed(64))
            .with_sampling(Sampling::TopP(0.5))
            .with_stops(["\n\n"]);

        assert_eq!(params.token_limit.fixed(), Some(64));
        assert_eq!(params.stops, vec!["\n\n".to_owned()]);
        assert_eq!(AnyCompletionParameters::from(params).kind(), PromptKind::Text);
    }
}
