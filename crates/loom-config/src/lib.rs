//! Configuration for Loom
//!
//! A single TOML file with `[llm]` and `[telemetry]` sections. Values may
//! reference environment variables as `{{ env.NAME }}`.

#![allow(clippy::must_use_candidate)]

mod env;
pub mod llm;
mod loader;
pub mod telemetry;

use serde::Deserialize;

pub use llm::*;
pub use telemetry::{ExportProtocol, ExporterConfig, LogFormat, TelemetryConfig, TracingConfig};

/// Top-level Loom configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Completion adapters
    #[serde(default)]
    pub llm: LlmConfig,
    /// Logging and trace export
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
