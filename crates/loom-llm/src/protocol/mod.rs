//! Vendor JSON formats
//!
//! Plain serde structs mirroring each vendor's HTTP API. Nothing outside
//! `convert` and `provider` should need them.

pub mod anthropic;
pub mod openai;

use serde::{Deserialize, Serialize};

/// Error body returned by both vendors
///
/// `OpenAI` and Anthropic wrap the message as `{"error": {"message": ...}}`;
/// anything else in the body is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}
