//! Provider-independent model addressing
//!
//! A [`ModelIdentifier`] names a model on any provider. Vendor adapters own an
//! enum of the models they know and convert to and from identifiers through
//! [`VendorModel`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::{ModelIdentifierKey, PromptContextValues};
use crate::error::{LoomError, Result};

/// Vendor that serves a model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelProvider {
    /// `OpenAI` and OpenAI-compatible APIs
    OpenAi,
    /// Anthropic Messages API
    Anthropic,
    /// Google Generative Language API
    Google,
    /// Mistral AI
    Mistral,
    /// Cohere
    Cohere,
    /// Groq
    Groq,
    /// Any other vendor, by tag
    Other(ProviderTag),
}

/// Lowercase tag of a vendor outside the known set
///
/// Only built through `ModelProvider::from`, so a known tag always maps to
/// its own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderTag(String);

impl ProviderTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ModelProvider {
    /// Canonical lowercase tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Mistral => "mistral",
            Self::Cohere => "cohere",
            Self::Groq => "groq",
            Self::Other(tag) => tag.as_str(),
        }
    }
}

impl From<&str> for ModelProvider {
    fn from(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        match tag.as_str() {
            "openai" => Self::OpenAi,
            "anthropic" => Self::Anthropic,
            "google" => Self::Google,
            "mistral" => Self::Mistral,
            "cohere" => Self::Cohere,
            "groq" => Self::Groq,
            _ => Self::Other(ProviderTag(tag)),
        }
    }
}

impl From<String> for ModelProvider {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<ModelProvider> for String {
    fn from(provider: ModelProvider) -> Self {
        match provider {
            ModelProvider::Other(tag) => tag.0,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider + name + optional revision
///
/// The textual form is `provider/name` or `provider/name@revision`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelIdentifier {
    /// Serving vendor
    pub provider: ModelProvider,
    /// Vendor model name (e.g. "gpt-4o-mini")
    pub name: String,
    /// Optional pinned revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl ModelIdentifier {
    pub fn new(provider: ModelProvider, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
            revision: None,
        }
    }

    /// Pin a revision
    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)?;
        if let Some(revision) = &self.revision {
            write!(f, "@{revision}")?;
        }
        Ok(())
    }
}

/// Error parsing the textual form of a [`ModelIdentifier`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid model identifier {0:?}, expected provider/name[@revision]")]
pub struct ParseModelIdentifierError(String);

impl FromStr for ModelIdentifier {
    type Err = ParseModelIdentifierError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ParseModelIdentifierError(s.to_owned());

        let (provider, rest) = s.split_once('/').ok_or_else(invalid)?;
        let (name, revision) = match rest.rsplit_once('@') {
            Some((name, revision)) => (name, Some(revision)),
            None => (rest, None),
        };

        if provider.is_empty() || name.is_empty() || revision.is_some_and(str::is_empty) {
            return Err(invalid());
        }

        Ok(Self {
            provider: ModelProvider::from(provider),
            name: name.to_owned(),
            revision: revision.map(ToOwned::to_owned),
        })
    }
}

/// A vendor's own enumeration of models
pub trait VendorModel: Sized + Copy + Send + Sync + 'static {
    /// Provider serving every model of this enum
    fn provider() -> ModelProvider;

    /// Vendor model name
    fn name(self) -> &'static str;

    /// Look up a model by vendor name
    fn from_name(name: &str) -> Option<Self>;

    /// Whether a pinned revision is acceptable for this vendor
    fn accepts_revision(_revision: &str) -> bool {
        false
    }

    /// Identifier addressing this model
    fn model_identifier(self) -> ModelIdentifier {
        ModelIdentifier::new(Self::provider(), self.name())
    }

    /// Convert an identifier into this vendor's model
    ///
    /// # Errors
    ///
    /// `IllegalModelIdentifier` if the identifier names another provider or
    /// a revision the vendor does not accept, `UnexpectedModelName` if the
    /// name is unknown.
    fn from_model_identifier(identifier: &ModelIdentifier) -> Result<Self> {
        let expected = Self::provider();
        let illegal = || LoomError::IllegalModelIdentifier {
            identifier: identifier.clone(),
            expected: Self::provider(),
        };

        if identifier.provider != expected {
            return Err(illegal());
        }

        if let Some(revision) = &identifier.revision
            && !Self::accepts_revision(revision)
        {
            return Err(illegal());
        }

        Self::from_name(&identifier.name).ok_or_else(|| LoomError::UnexpectedModelName {
            identifier: identifier.clone(),
        })
    }
}

/// Resolve the model a prompt should run on
///
/// An identifier stored under [`ModelIdentifierKey`] wins; otherwise
/// `fallback` is used.
///
/// # Errors
///
/// Propagates [`VendorModel::from_model_identifier`] failures.
pub fn resolve_model<M: VendorModel>(context: &PromptContextValues, fallback: M) -> Result<M> {
    context
        .get::<ModelIdentifierKey>()
        .map_or(Ok(fallback), M::from_model_identifier)
}
