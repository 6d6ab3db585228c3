use thiserror::Error;

use crate::function::FunctionName;
use crate::model::{ModelIdentifier, ModelProvider};
use crate::prompt::PromptKind;

/// Core result type
pub type Result<T, E = LoomError> = std::result::Result<T, E>;

/// Errors raised by prompt dispatch, model resolution and argument decoding
#[derive(Debug, Error)]
pub enum LoomError {
    /// Handler cannot service this prompt variant
    #[error("unsupported prompt type: {0}")]
    UnsupportedPromptType(PromptKind),

    /// Parameters of one prompt variant were paired with another variant
    #[error("{parameters} completion parameters cannot complete a {prompt} prompt")]
    ParameterMismatch {
        /// Variant of the prompt
        prompt: PromptKind,
        /// Variant of the supplied parameters
        parameters: PromptKind,
    },

    /// Model identifier belongs to another provider or carries a disallowed revision
    #[error("illegal model identifier {identifier} for provider {expected}")]
    IllegalModelIdentifier {
        /// Offending identifier
        identifier: ModelIdentifier,
        /// Provider the handler serves
        expected: ModelProvider,
    },

    /// Model name does not match any known model of the provider
    #[error("unexpected model name: {identifier}")]
    UnexpectedModelName { identifier: ModelIdentifier },

    /// Function-call arguments could not be decoded into the requested type
    #[error("failed to decode {target} from {raw:?}: {source}")]
    DecodeFailure {
        /// Raw argument text as received from the vendor
        raw: String,
        /// Name of the requested target type
        target: &'static str,
        /// Error from the first decode attempt
        source: serde_json::Error,
    },

    /// Structurally valid conversion that is not supported
    #[error("conversion of structured arguments to {target} is not implemented")]
    UnimplementedConversion { target: &'static str },

    /// A result matched by name fits more than one outstanding call
    #[error("result for function {name} matches more than one call")]
    AmbiguousFunctionResult { name: FunctionName },

    /// A result does not answer any outstanding call
    #[error("result for function {name} matches no call")]
    UnknownFunctionResult { name: FunctionName },

    /// No handler is registered for the provider
    #[error("no completion handler registered for provider {provider}")]
    NoHandler { provider: ModelProvider },

    /// Request is malformed before it reaches the vendor
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Vendor returned an error or could not be reached
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Vendor response could not be mapped into a completion
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    /// Vendor rejected the credentials
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// Vendor rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimited {
        /// Seconds until the limit resets, when the vendor says so
        retry_after: Option<u64>,
    },

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Broad class of a [`LoomError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Programmer error: wrong pairing, wrong provider, malformed request
    ShapeMismatch,
    /// Data-dependent failure such as malformed arguments
    Data,
    /// Functionality that is missing rather than failing
    Capability,
    /// Network or vendor-side failure
    Transport,
    /// Anything else
    Internal,
}

impl LoomError {
    /// Classify this error
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ParameterMismatch { .. }
            | Self::IllegalModelIdentifier { .. }
            | Self::UnexpectedModelName { .. }
            | Self::InvalidRequest(_) => ErrorCategory::ShapeMismatch,
            Self::DecodeFailure { .. } | Self::AmbiguousFunctionResult { .. } | Self::UnknownFunctionResult { .. } => {
                ErrorCategory::Data
            }
            Self::UnsupportedPromptType(_) | Self::UnimplementedConversion { .. } | Self::NoHandler { .. } => {
                ErrorCategory::Capability
            }
            Self::Upstream(_) | Self::InvalidResponse(_) | Self::Unauthorized(_) | Self::RateLimited { .. } => {
                ErrorCategory::Transport
            }
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether retrying the same request could succeed
    ///
    /// The core never retries; this is a hint for adapter-level policies.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let unsupported = LoomError::UnsupportedPromptType(PromptKind::Text);
        assert_eq!(unsupported.category(), ErrorCategory::Capability);
        assert!(!unsupported.is_retryable());

        let mismatch = LoomError::ParameterMismatch {
            prompt: PromptKind::Text,
            parameters: PromptKind::Chat,
        };
        assert_eq!(mismatch.category(), ErrorCategory::ShapeMismatch);
        assert_eq!(
            mismatch.to_string(),
            "chat completion parameters cannot complete a text prompt"
        );

        let upstream = LoomError::Upstream("boom".to_owned());
        assert_eq!(upstream.category(), ErrorCategory::Transport);
        assert!(upstream.is_retryable());
    }

    #[test]
    fn unimplemented_is_not_a_decode_failure() {
        let err = LoomError::UnimplementedConversion { target: "Foo" };
        assert_eq!(err.category(), ErrorCategory::Capability);
        assert!(!matches!(err, LoomError::DecodeFailure { .. }));
    }
}
