//! Explicit registry of completion handlers
//!
//! The registry is built by the application entry point, handed to whatever
//! needs to complete prompts, and torn down with [`HandlerRegistry::shutdown`].
//! There is no process-wide instance.

use std::fmt;
use std::sync::Arc;

use loom_config::LlmConfig;
use loom_core::{
    AnyCompletion, AnyCompletionParameters, AnyPrompt, CompletionHandler, CompletionHandlerExt, LoomError,
    ModelIdentifierKey, ModelProvider, Prompt, PromptContextValues, Result,
};
use tracing::Instrument;

use crate::provider::build_adapter;

/// Opaque handle assigned to a handler at registration
///
/// Handles are never reused within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u32);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

struct Entry {
    id: HandlerId,
    handler: Arc<dyn CompletionHandler>,
}

/// Handlers available to the application, keyed by [`HandlerId`]
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Vec<Entry>,
    next_id: u32,
    default: Option<HandlerId>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one adapter per configured provider
    ///
    /// The configured default provider (or the first one) becomes the
    /// registry default.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut registry = Self::new();
        let default_name = config.default_provider().map(|(name, _)| name);

        for (name, provider) in &config.providers {
            let id = registry.register(build_adapter(name, provider)?);
            if default_name == Some(name.as_str()) {
                registry.set_default(id)?;
            }
        }

        Ok(registry)
    }

    /// Add a handler, returning its handle
    ///
    /// The first handler registered becomes the default until
    /// [`set_default`](Self::set_default) says otherwise.
    pub fn register(&mut self, handler: Arc<dyn CompletionHandler>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        tracing::debug!(handler = %id, name = handler.name(), provider = %handler.provider(), "registered handler");

        self.entries.push(Entry { id, handler });
        self.default.get_or_insert(id);
        id
    }

    /// Use `id` for prompts that carry no model identifier
    pub fn set_default(&mut self, id: HandlerId) -> Result<()> {
        if self.get(id).is_none() {
            return Err(LoomError::InvalidRequest(format!("{id} is not registered")));
        }
        self.default = Some(id);
        Ok(())
    }

    pub fn get(&self, id: HandlerId) -> Option<&Arc<dyn CompletionHandler>> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.handler)
    }

    /// First handler registered for `provider`
    pub fn for_provider(&self, provider: &ModelProvider) -> Option<(HandlerId, &Arc<dyn CompletionHandler>)> {
        self.entries
            .iter()
            .find(|e| &e.handler.provider() == provider)
            .map(|e| (e.id, &e.handler))
    }

    /// Handler that should complete a prompt with `context`
    ///
    /// A model identifier in the context selects by provider; otherwise the
    /// default handler is used.
    ///
    /// # Errors
    ///
    /// `NoHandler` if no handler serves the identifier's provider,
    /// `InvalidRequest` if the registry is empty.
    pub fn resolve(&self, context: &PromptContextValues) -> Result<(HandlerId, &Arc<dyn CompletionHandler>)> {
        if let Some(identifier) = context.get::<ModelIdentifierKey>() {
            return self.for_provider(&identifier.provider).ok_or_else(|| LoomError::NoHandler {
                provider: identifier.provider.clone(),
            });
        }

        self.default
            .and_then(|id| self.get(id).map(|handler| (id, handler)))
            .ok_or_else(|| LoomError::InvalidRequest("no completion handler registered".to_owned()))
    }

    /// Complete `prompt` on the handler selected by [`resolve`](Self::resolve)
    pub async fn complete<P: Prompt>(&self, prompt: &P, parameters: &P::Parameters) -> Result<P::Completion> {
        let (id, handler) = self.resolve(prompt.context())?;
        let kind = P::KIND;
        let span = tracing::info_span!("completion", handler = %id, name = handler.name(), kind = %kind);

        handler.complete(prompt, parameters).instrument(span).await
    }

    /// Complete a runtime-selected prompt variant
    pub async fn complete_any(&self, prompt: &AnyPrompt, parameters: &AnyCompletionParameters) -> Result<AnyCompletion> {
        let (id, handler) = self.resolve(prompt.context())?;
        let span = tracing::info_span!("completion", handler = %id, name = handler.name(), kind = %prompt.kind());

        handler.complete_any(prompt, parameters).instrument(span).await
    }

    pub fn handlers(&self) -> impl Iterator<Item = (HandlerId, &Arc<dyn CompletionHandler>)> {
        self.entries.iter().map(|e| (e.id, &e.handler))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every handler
    ///
    /// In-flight requests holding their own `Arc` finish normally.
    pub fn shutdown(self) {
        for entry in self.entries {
            tracing::debug!(handler = %entry.id, name = entry.handler.name(), "releasing handler");
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.entries.iter().map(|e| (e.id, e.handler.name())).collect::<Vec<_>>())
            .field("default", &self.default)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use loom_config::Config;
    use loom_core::{
        ChatCompletion, ChatCompletionParameters, ChatMessage, ChatPrompt, HandlerCapabilities, ModelIdentifier,
        PromptKind, TextPrompt,
    };

    use super::*;

    struct Echo {
        name: &'static str,
        provider: ModelProvider,
    }

    #[async_trait]
    impl CompletionHandler for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn provider(&self) -> ModelProvider {
            self.provider.clone()
        }

        fn capabilities(&self) -> HandlerCapabilities {
            HandlerCapabilities {
                text: false,
                chat: true,
                function_calling: false,
            }
        }

        async fn complete_chat(
            &self,
            prompt: &ChatPrompt,
            _parameters: &ChatCompletionParameters,
        ) -> Result<ChatCompletion> {
            Ok(ChatCompletion {
                prompt: prompt.messages.clone(),
                message: ChatMessage::assistant(self.name),
                function_calls: Vec::new(),
                stop_reason: None,
                model: None,
            })
        }
    }

    fn echo(name: &'static str, provider: ModelProvider) -> Arc<dyn CompletionHandler> {
        Arc::new(Echo { name, provider })
    }

    #[test]
    fn handles_are_stable_and_distinct() {
        let mut registry = HandlerRegistry::new();
        let first = registry.register(echo("a", ModelProvider::OpenAi));
        let second = registry.register(echo("b", ModelProvider::OpenAi));

        assert_ne!(first, second);
        assert_eq!(registry.get(first).unwrap().name(), "a");
        assert_eq!(registry.get(second).unwrap().name(), "b");
        assert_eq!(registry.len(), 2);
        assert_eq!(first.to_string(), "handler#0");
    }

    #[test]
    fn selects_by_provider_then_default() {
        let mut registry = HandlerRegistry::new();
        let openai = registry.register(echo("openai", ModelProvider::OpenAi));
        let claude = registry.register(echo("claude", ModelProvider::Anthropic));

        let (id, _) = registry.resolve(&PromptContextValues::new()).unwrap();
        assert_eq!(id, openai);

        registry.set_default(claude).unwrap();
        let (id, _) = registry.resolve(&PromptContextValues::new()).unwrap();
        assert_eq!(id, claude);

        let context = PromptContextValues::new()
            .with::<ModelIdentifierKey>(ModelIdentifier::new(ModelProvider::OpenAi, "gpt-4o"));
        let (id, _) = registry.resolve(&context).unwrap();
        assert_eq!(id, openai);

        let context = PromptContextValues::new()
            .with::<ModelIdentifierKey>(ModelIdentifier::new(ModelProvider::Mistral, "large"));
        assert!(matches!(
            registry.resolve(&context),
            Err(LoomError::NoHandler { provider: ModelProvider::Mistral })
        ));
    }

    #[test]
    fn empty_registry() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.resolve(&PromptContextValues::new()),
            Err(LoomError::InvalidRequest(_))
        ));

        registry.register(echo("only", ModelProvider::OpenAi));
        assert!(registry.set_default(HandlerId(7)).is_err());
    }

    #[tokio::test]
    async fn dispatches_typed_prompts() {
        let mut registry = HandlerRegistry::new();
        registry.register(echo("openai", ModelProvider::OpenAi));
        registry.register(echo("claude", ModelProvider::Anthropic));

        let prompt = ChatPrompt::new(vec![ChatMessage::user("who?")])
            .with_model(ModelIdentifier::new(ModelProvider::Anthropic, "claude-3-5-haiku-latest"));
        let completion = registry.complete(&prompt, &ChatCompletionParameters::default()).await.unwrap();
        assert_eq!(completion.text(), Some("claude"));

        let err = registry
            .complete(&TextPrompt::new("Once"), &Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LoomError::UnsupportedPromptType(PromptKind::Text)));

        registry.shutdown();
    }

    #[test]
    fn built_from_config() {
        let config = Config::from_toml_str(
            "[llm]\ndefault_provider = \"claude\"\n\n[llm.providers.openai]\ntype = \"openai\"\n\n[llm.providers.claude]\ntype = \"anthropic\"\n",
        )
        .unwrap();

        let registry = HandlerRegistry::from_config(&config.llm).unwrap();
        assert_eq!(registry.len(), 2);

        let (_, handler) = registry.resolve(&PromptContextValues::new()).unwrap();
        assert_eq!(handler.name(), "claude");
        assert_eq!(handler.provider(), ModelProvider::Anthropic);
        assert!(!handler.capabilities().supports(PromptKind::Text));
    }

    #[test]
    fn first_configured_provider_is_default() {
        let config = Config::from_toml_str(
            "[llm.providers.zeta]\ntype = \"openai\"\n\n[llm.providers.alpha]\ntype = \"anthropic\"\n",
        )
        .unwrap();

        let registry = HandlerRegistry::from_config(&config.llm).unwrap();
        let names: Vec<_> = registry.handlers().map(|(_, handler)| handler.name()).collect();
        assert_eq!(names, ["zeta", "alpha"]);

        let (id, handler) = registry.resolve(&PromptContextValues::new()).unwrap();
        assert_eq!(handler.name(), "zeta");
        assert_eq!(registry.handlers().next().map(|(first, _)| first), Some(id));
    }
}
