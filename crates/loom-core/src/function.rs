//! Function (tool) definitions, calls emitted by the model, and the
//! results fed back to it

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::arguments::Arguments;
use crate::context::PromptContextValues;
use crate::error::{LoomError, Result};

/// Name of a function as seen by the model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionName(String);

impl FunctionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FunctionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FunctionName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for FunctionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Opaque identity of a [`ChatFunctionDefinition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatFunctionId(Uuid);

impl ChatFunctionId {
    /// Generate a new random identifier
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ChatFunctionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChatFunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// JSON Schema describing function parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonSchema(serde_json::Value);

impl JsonSchema {
    pub const fn new(schema: serde_json::Value) -> Self {
        Self(schema)
    }

    /// Schema of an object without properties
    pub fn empty_object() -> Self {
        Self(serde_json::json!({ "type": "object", "properties": {} }))
    }

    /// Derive the schema of a Rust type
    pub fn for_type<T: schemars::JsonSchema>() -> Self {
        let mut schema = serde_json::Value::from(schemars::schema_for!(T));
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
        }
        Self(schema)
    }

    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl Default for JsonSchema {
    fn default() -> Self {
        Self::empty_object()
    }
}

/// Function the model may call
///
/// Two definitions are equal when their ids are equal, regardless of the
/// other fields.
#[derive(Debug, Clone)]
pub struct ChatFunctionDefinition {
    /// Opaque identity, fresh unless supplied
    pub id: ChatFunctionId,
    /// Name the model uses to call the function
    pub name: FunctionName,
    /// Description shown to the model
    pub context: String,
    /// Schema of the arguments
    pub parameters: JsonSchema,
}

impl ChatFunctionDefinition {
    /// Define a function with a freshly generated id
    pub fn new(name: impl Into<FunctionName>, context: impl Into<String>, parameters: JsonSchema) -> Self {
        Self {
            id: ChatFunctionId::fresh(),
            name: name.into(),
            context: context.into(),
            parameters,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: ChatFunctionId) -> Self {
        self.id = id;
        self
    }
}

impl PartialEq for ChatFunctionDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ChatFunctionDefinition {}

impl Hash for ChatFunctionDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Ensure no two definitions share a name
///
/// # Errors
///
/// `InvalidRequest` naming the first duplicated function.
pub fn ensure_unique_names(functions: &[ChatFunctionDefinition]) -> Result<()> {
    let mut seen = std::collections::HashSet::with_capacity(functions.len());
    for function in functions {
        if !seen.insert(function.name.as_str()) {
            return Err(LoomError::InvalidRequest(format!(
                "function name {} is defined more than once",
                function.name
            )));
        }
    }
    Ok(())
}

/// Call emitted by the model, waiting to be invoked by the caller
///
/// Equality ignores `context`.
#[derive(Debug, Clone)]
pub struct ChatFunctionCall {
    /// Vendor-assigned call id, when the vendor provides one
    pub function_id: Option<String>,
    /// Function to invoke
    pub name: FunctionName,
    /// Arguments in the vendor's original encoding
    pub arguments: Arguments,
    /// Side-channel values attached by the adapter
    pub context: PromptContextValues,
}

impl ChatFunctionCall {
    pub fn new(name: impl Into<FunctionName>, arguments: Arguments) -> Self {
        Self {
            function_id: None,
            name: name.into(),
            arguments,
            context: PromptContextValues::new(),
        }
    }

    #[must_use]
    pub fn with_function_id(mut self, id: impl Into<String>) -> Self {
        self.function_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: PromptContextValues) -> Self {
        self.context = context;
        self
    }

    /// Decode the arguments into `T`
    ///
    /// # Errors
    ///
    /// See [`Arguments::decode`].
    pub fn decode_arguments<T: DeserializeOwned + 'static>(&self) -> Result<T> {
        self.arguments.decode()
    }
}

impl PartialEq for ChatFunctionCall {
    fn eq(&self, other: &Self) -> bool {
        self.function_id == other.function_id && self.name == other.name && self.arguments == other.arguments
    }
}

/// Raw output of a function invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionResult(String);

impl FunctionResult {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Serialize a value as the result
    ///
    /// # Errors
    ///
    /// `Internal` if `value` cannot be serialized.
    pub fn json<T: Serialize>(value: &T) -> Result<Self> {
        serde_json::to_string(value)
            .map(Self)
            .map_err(|e| LoomError::Internal(e.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FunctionResult {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for FunctionResult {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Result of invoking a [`ChatFunctionCall`], fed back to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultOfFunctionCall {
    /// Id of the call this answers, when known
    pub function_id: Option<String>,
    /// Function that was invoked
    pub name: FunctionName,
    /// Output of the function
    pub result: FunctionResult,
}

impl ResultOfFunctionCall {
    pub fn new(name: impl Into<FunctionName>, result: impl Into<FunctionResult>) -> Self {
        Self {
            function_id: None,
            name: name.into(),
            result: result.into(),
        }
    }

    /// Result answering `call`, carrying over its id and name
    pub fn answering(call: &ChatFunctionCall, result: impl Into<FunctionResult>) -> Self {
        Self {
            function_id: call.function_id.clone(),
            name: call.name.clone(),
            result: result.into(),
        }
    }

    #[must_use]
    pub fn with_function_id(mut self, id: impl Into<String>) -> Self {
        self.function_id = Some(id.into());
        self
    }
}
