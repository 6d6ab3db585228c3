//! Side-channel values carried by prompts and function calls
//!
//! [`PromptContextValues`] is a typed-key map: every key is a type
//! implementing [`PromptContextKey`], and the key fixes the type of its
//! value, so lookups never need a runtime type check at the call site.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::function::{ChatFunctionDefinition, ChatFunctionId};
use crate::model::ModelIdentifier;

/// Key into [`PromptContextValues`]
pub trait PromptContextKey: 'static {
    /// Type stored under this key
    type Value: Send + Sync + 'static;

    /// Human-readable key name, used in debug output
    const NAME: &'static str;
}

/// Explicit model the prompt must run on
#[derive(Debug)]
pub struct ModelIdentifierKey;

impl PromptContextKey for ModelIdentifierKey {
    type Value = ModelIdentifier;
    const NAME: &'static str = "model_identifier";
}

/// Functions exposed to the model for a chat prompt
#[derive(Debug)]
pub struct FunctionsKey;

impl PromptContextKey for FunctionsKey {
    type Value = Vec<ChatFunctionDefinition>;
    const NAME: &'static str = "functions";
}

/// Definition a function call was resolved against
#[derive(Debug)]
pub struct FunctionCallIdKey;

impl PromptContextKey for FunctionCallIdKey {
    type Value = ChatFunctionId;
    const NAME: &'static str = "function_call_id";
}

/// Vendor-specific payload attached by an adapter (e.g. the raw tool call)
#[derive(Debug)]
pub struct ProviderMetadataKey;

impl PromptContextKey for ProviderMetadataKey {
    type Value = serde_json::Value;
    const NAME: &'static str = "provider_metadata";
}

#[derive(Clone)]
struct Entry {
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Typed-key map of side-channel values
///
/// Cloning shares the stored values.
#[derive(Clone, Default)]
pub struct PromptContextValues {
    entries: HashMap<TypeId, Entry>,
}

impl PromptContextValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with<K: PromptContextKey>(mut self, value: K::Value) -> Self {
        self.insert::<K>(value);
        self
    }

    /// Store a value, returning whether a previous value was replaced
    pub fn insert<K: PromptContextKey>(&mut self, value: K::Value) -> bool {
        self.entries
            .insert(
                TypeId::of::<K>(),
                Entry {
                    name: K::NAME,
                    value: Arc::new(value),
                },
            )
            .is_some()
    }

    /// Look up the value stored under `K`
    pub fn get<K: PromptContextKey>(&self) -> Option<&K::Value> {
        self.entries
            .get(&TypeId::of::<K>())
            .and_then(|entry| entry.value.downcast_ref::<K::Value>())
    }

    pub fn contains<K: PromptContextKey>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<K>())
    }

    /// Remove the value stored under `K`, returning whether one existed
    pub fn remove<K: PromptContextKey>(&mut self) -> bool {
        self.entries.remove(&TypeId::of::<K>()).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combine two maps; values in `other` win
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(id, entry)| (*id, entry.clone())));
        Self { entries }
    }
}

impl fmt::Debug for PromptContextValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.values().map(|entry| entry.name).collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}
