//! Function-call arguments and their decoding
//!
//! Vendors hand arguments over either as JSON text or as an already
//! structured object. [`Arguments`] keeps whichever form arrived and decodes
//! lazily. Text payloads are decoded with a two-step key convention chain:
//! snake_case keys are first rewritten to camelCase, and if that does not
//! fit the target type the original keys are tried verbatim.

use std::any::{Any, TypeId, type_name};

use convert_case::{Case, Casing};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LoomError, Result};

/// Arguments of a function call, in the encoding the vendor used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arguments {
    /// JSON text, not yet parsed
    Undecoded(String),
    /// Structured key/value object
    Structured(Map<String, Value>),
}

/// Key naming convention applied before decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyConvention {
    /// Rewrite `snake_case` object keys to `camelCase`, recursively
    SnakeToCamel,
    /// Use keys exactly as received
    Verbatim,
}

impl KeyConvention {
    /// Rewrite `value` according to this convention
    pub fn apply(self, value: Value) -> Value {
        match self {
            Self::SnakeToCamel => camel_case_keys(value),
            Self::Verbatim => value,
        }
    }

    /// Decode `value` into `T` under this convention
    ///
    /// # Errors
    ///
    /// The deserialization error for `T`.
    pub fn try_decode<T: DeserializeOwned>(self, value: Value) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_value(self.apply(value))
    }
}

fn camel_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (camel_case_key(key), camel_case_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camel_case_keys).collect()),
        other => other,
    }
}

// Keys without an inner underscore are left alone so that already-camelCase
// and acronym keys survive.
fn camel_case_key(key: String) -> String {
    if key.trim_matches('_').contains('_') {
        key.from_case(Case::Snake).to_case(Case::Camel)
    } else {
        key
    }
}

impl Arguments {
    /// Encode `value` as JSON text
    ///
    /// # Errors
    ///
    /// `Internal` if `value` cannot be serialized.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        serde_json::to_string(value)
            .map(Self::Undecoded)
            .map_err(|e| LoomError::Internal(e.into()))
    }

    /// Decode into `T`
    ///
    /// Text payloads try [`KeyConvention::SnakeToCamel`] and then
    /// [`KeyConvention::Verbatim`]; if both fail, the first error is
    /// reported. Decoding into [`Value`] returns the parsed tree unchanged.
    ///
    /// Structured payloads only convert into [`String`] (as JSON text) and
    /// [`Value`].
    ///
    /// # Errors
    ///
    /// `DecodeFailure` for malformed JSON or a payload that fits `T` under
    /// neither convention; `UnimplementedConversion` for an unsupported
    /// target of a structured payload.
    pub fn decode<T: DeserializeOwned + 'static>(&self) -> Result<T> {
        match self {
            Self::Undecoded(raw) => {
                let value = parse_json::<T>(raw)?;
                if TypeId::of::<T>() == TypeId::of::<Value>() {
                    return downcast(value);
                }

                KeyConvention::SnakeToCamel
                    .try_decode::<T>(value.clone())
                    .or_else(|first| {
                        tracing::debug!(
                            target_type = type_name::<T>(),
                            error = %first,
                            "camelCase decode failed, retrying with verbatim keys"
                        );
                        KeyConvention::Verbatim.try_decode::<T>(value).map_err(|_| first)
                    })
                    .map_err(|source| decode_failure::<T>(raw, source))
            }
            Self::Structured(map) => convert_structured(map),
        }
    }

    /// Decode into `T` using a single key convention
    ///
    /// # Errors
    ///
    /// As for [`Arguments::decode`].
    pub fn decode_with<T: DeserializeOwned + 'static>(&self, convention: KeyConvention) -> Result<T> {
        match self {
            Self::Undecoded(raw) => {
                let value = parse_json::<T>(raw)?;
                convention
                    .try_decode::<T>(value)
                    .map_err(|source| decode_failure::<T>(raw, source))
            }
            Self::Structured(map) => convert_structured(map),
        }
    }

    /// Arguments as a JSON tree
    ///
    /// # Errors
    ///
    /// `DecodeFailure` if a text payload is not valid JSON.
    pub fn to_json_value(&self) -> Result<Value> {
        match self {
            Self::Undecoded(raw) => parse_json::<Value>(raw),
            Self::Structured(map) => Ok(Value::Object(map.clone())),
        }
    }

    /// Arguments as JSON text
    ///
    /// Text payloads are returned exactly as received.
    pub fn to_json_string(&self) -> String {
        match self {
            Self::Undecoded(raw) => raw.clone(),
            Self::Structured(map) => Value::Object(map.clone()).to_string(),
        }
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Self::Structured(Map::new())
    }
}

fn parse_json<T>(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|source| decode_failure::<T>(raw, source))
}

fn decode_failure<T>(raw: &str, source: serde_json::Error) -> LoomError {
    LoomError::DecodeFailure {
        raw: raw.to_owned(),
        target: type_name::<T>(),
        source,
    }
}

fn convert_structured<T: 'static>(map: &Map<String, Value>) -> Result<T> {
    let target = TypeId::of::<T>();

    if target == TypeId::of::<Value>() {
        downcast(Value::Object(map.clone()))
    } else if target == TypeId::of::<String>() {
        downcast(Value::Object(map.clone()).to_string())
    } else {
        Err(LoomError::UnimplementedConversion {
            target: type_name::<T>(),
        })
    }
}

fn downcast<T: 'static, V: 'static>(value: V) -> Result<T> {
    let boxed: Box<dyn Any> = Box::new(value);
    boxed
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| LoomError::UnimplementedConversion {
            target: type_name::<T>(),
        })
}
