//! Vendor adapters for Loom
//!
//! Wire `protocol` types, `convert` functions between them and the core
//! model, one `provider` adapter per vendor, and the [`HandlerRegistry`] that
//! selects among them.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod model;
pub mod protocol;
pub mod provider;
pub mod registry;

pub use model::{AnthropicModel, OpenAiModel};
pub use provider::{AnthropicAdapter, OpenAiAdapter, build_adapter};
pub use registry::{HandlerId, HandlerRegistry};
