//! Vendor adapters implementing [`CompletionHandler`]

pub mod anthropic;
pub mod openai;

use std::sync::Arc;

use http::StatusCode;
use http::header::RETRY_AFTER;
use loom_config::{LlmProviderConfig, LlmProviderType};
use loom_core::{CompletionHandler, LoomError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

pub use self::anthropic::AnthropicAdapter;
pub use self::openai::OpenAiAdapter;
use crate::protocol::ErrorEnvelope;

/// Build the adapter described by `config`
///
/// # Errors
///
/// Returns an error if the adapter rejects its configuration.
pub fn build_adapter(name: &str, config: &LlmProviderConfig) -> Result<Arc<dyn CompletionHandler>> {
    let adapter: Arc<dyn CompletionHandler> = match config.provider_type {
        LlmProviderType::Openai => Arc::new(OpenAiAdapter::new(name, config)?),
        LlmProviderType::Anthropic => Arc::new(AnthropicAdapter::new(name, config)?),
    };
    Ok(adapter)
}

/// HTTP client honoring the configured timeout
pub(crate) fn http_client(config: &LlmProviderConfig) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout()? {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| LoomError::Internal(e.into()))
}

/// Configured base URL, or the vendor's public one
pub(crate) fn base_url(config: &LlmProviderConfig, default: &str) -> Result<Url> {
    match &config.base_url {
        Some(url) => Ok(url.clone()),
        None => Url::parse(default).map_err(|e| LoomError::Internal(e.into())),
    }
}

/// `base` joined with `path`, tolerating a trailing slash on `base`
pub(crate) fn endpoint(base: &Url, path: &str) -> String {
    format!("{}/{path}", base.as_str().trim_end_matches('/'))
}

/// Send a request and decode a successful JSON response
pub(crate) async fn send_json<T: DeserializeOwned>(adapter: &str, request: RequestBuilder) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        tracing::error!(provider = %adapter, error = %e, "upstream request failed");
        LoomError::Upstream(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider = %adapter, status = %status, "upstream returned error");
        return Err(error_for_status(status, retry_after, &body));
    }

    response.json().await.map_err(|e| {
        tracing::error!(provider = %adapter, error = %e, "failed to decode upstream response");
        LoomError::InvalidResponse(e.to_string())
    })
}

fn error_for_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> LoomError {
    let message = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(|_| body.to_owned(), |e| e.error.message);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LoomError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => LoomError::RateLimited { retry_after },
        _ => LoomError::Upstream(format!("provider returned {status}: {message}")),
    }
}
