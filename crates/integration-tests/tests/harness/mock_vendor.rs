//! Mock vendor backend for integration tests
//!
//! Serves just enough of the `OpenAI` chat/completions and Anthropic messages
//! APIs to drive the adapters. Chat requests that offer a `get_weather` tool
//! get a tool call back until the conversation carries its result.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::config::TEST_KEY;

/// Reply the mock gives to ordinary chat requests
pub const CHAT_REPLY: &str = "Hello from mock LLM";
/// Continuation returned for text completions
pub const TEXT_REPLY: &str = " upon a time";

/// Failure the mock returns instead of a completion
#[derive(Debug, Clone, Copy)]
pub struct Failure {
    pub status: StatusCode,
    pub retry_after: Option<u64>,
}

pub struct MockVendor {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    request_count: AtomicU32,
    requests: Mutex<Vec<Value>>,
    failure: Option<Failure>,
}

impl MockVendor {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(None).await
    }

    /// Start a mock server that answers every request with `status`
    pub async fn start_failing(status: StatusCode, retry_after: Option<u64>) -> anyhow::Result<Self> {
        Self::start_inner(Some(Failure { status, retry_after })).await
    }

    async fn start_inner(failure: Option<Failure>) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            request_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            failure,
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/v1/completions", routing::post(handle_completions))
            .route("/v1/messages", routing::post(handle_messages))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider
    ///
    /// Includes `/v1` since the adapters append paths like `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Request bodies received so far, oldest first
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Value {
        self.requests().pop().expect("at least one request")
    }
}

impl Drop for MockVendor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl MockState {
    fn record(&self, body: &Value) -> Option<Response> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().unwrap().push(body.clone());

        self.failure.map(|failure| {
            let mut response = (
                failure.status,
                Json(json!({
                    "error": {"type": "mock_error", "message": format!("mock failure {}", failure.status.as_u16())}
                })),
            )
                .into_response();
            if let Some(seconds) = failure.retry_after {
                response
                    .headers_mut()
                    .insert("retry-after", seconds.to_string().parse().unwrap());
            }
            response
        })
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"type": "authentication_error", "message": "invalid api key"}})),
    )
        .into_response()
}

/// Whether `tools` holds a definition whose name sits at `name_pointer`
fn offers_weather(tools: Option<&Value>, name_pointer: &str) -> bool {
    tools.and_then(Value::as_array).is_some_and(|tools| {
        tools
            .iter()
            .any(|tool| tool.pointer(name_pointer).and_then(Value::as_str) == Some("get_weather"))
    })
}

async fn handle_chat_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = state.record(&body) {
        return failure;
    }
    let expected = format!("Bearer {TEST_KEY}");
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return unauthorized();
    }

    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let last = messages.last().cloned().unwrap_or(Value::Null);

    let (message, finish_reason) = if last["role"] == "tool" {
        let content = format!("It is {} in Paris.", last["content"].as_str().unwrap_or_default());
        (json!({"role": "assistant", "content": content}), "stop")
    } else if offers_weather(body.get("tools"), "/function/name") {
        (
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}
                }]
            }),
            "tool_calls",
        )
    } else {
        (json!({"role": "assistant", "content": CHAT_REPLY}), "stop")
    };

    Json(json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "created": 0,
        "model": body["model"],
        "choices": [{"index": 0, "message": message, "finish_reason": finish_reason}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
    .into_response()
}

async fn handle_completions(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.record(&body) {
        return failure;
    }

    Json(json!({
        "id": "cmpl-mock",
        "object": "text_completion",
        "created": 0,
        "model": body["model"],
        "choices": [{"index": 0, "text": TEXT_REPLY, "finish_reason": "stop"}]
    }))
    .into_response()
}

async fn handle_messages(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = state.record(&body) {
        return failure;
    }
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(TEST_KEY)
        || headers.get("anthropic-version").is_none()
    {
        return unauthorized();
    }

    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let last_block = messages
        .last()
        .and_then(|m| m["content"].as_array())
        .and_then(|blocks| blocks.last())
        .cloned()
        .unwrap_or(Value::Null);

    let (content, stop_reason) = if last_block["type"] == "tool_result" {
        let text = format!("It is {} in Paris.", last_block["content"].as_str().unwrap_or_default());
        (json!([{"type": "text", "text": text}]), "end_turn")
    } else if offers_weather(body.get("tools"), "/name") {
        (
            json!([
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "Paris"}}
            ]),
            "tool_use",
        )
    } else {
        (json!([{"type": "text", "text": CHAT_REPLY}]), "end_turn")
    };

    Json(json!({
        "id": "msg_mock",
        "type": "message",
        "role": "assistant",
        "model": body["model"],
        "content": content,
        "stop_reason": stop_reason,
        "usage": {"input_tokens": 10, "output_tokens": 5}
    }))
    .into_response()
}
