//! Chat prompts to Anthropic Messages requests and back

use loom_core::{
    Arguments, ChatCompletion, ChatCompletionParameters, ChatFunctionCall, ChatFunctionDefinition, ChatMessage,
    ChatMessageBody, ChatPrompt, ChatRole, LoomError, ModelIdentifier, ModelProvider, Result, StopReason, VendorModel,
};

use super::{CallLedger, call_context};
use crate::model::AnthropicModel;
use crate::protocol::anthropic::{AnthropicBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse, AnthropicTool};

const USER: &str = "user";
const ASSISTANT: &str = "assistant";

impl From<&ChatFunctionDefinition> for AnthropicTool {
    fn from(function: &ChatFunctionDefinition) -> Self {
        Self {
            name: function.name.to_string(),
            description: Some(function.context.clone()).filter(|d| !d.is_empty()),
            input_schema: function.parameters.as_value().clone(),
        }
    }
}

/// Build a Messages request
///
/// System messages are lifted into the top-level `system` field. Consecutive
/// blocks of the same role are merged, so function results that follow a
/// multi-call turn go back as one user message.
pub fn chat_request(
    model: AnthropicModel,
    prompt: &ChatPrompt,
    parameters: &ChatCompletionParameters,
    functions: &[ChatFunctionDefinition],
) -> Result<AnthropicRequest> {
    let mut ledger = CallLedger::default();
    let mut system = Vec::new();
    let mut messages: Vec<AnthropicMessage> = Vec::new();

    for message in &prompt.messages {
        let (role, block) = match (&message.body, message.role) {
            (ChatMessageBody::Text(text), ChatRole::System) => {
                system.push(text.as_str());
                continue;
            }
            (ChatMessageBody::Text(text), _) if text.is_empty() => continue,
            (ChatMessageBody::Text(text), ChatRole::User) => (USER, AnthropicBlock::Text { text: text.clone() }),
            (ChatMessageBody::Text(text), ChatRole::Assistant) => {
                (ASSISTANT, AnthropicBlock::Text { text: text.clone() })
            }
            (ChatMessageBody::Text(_), ChatRole::Function) => {
                return Err(LoomError::InvalidRequest(
                    "function messages must carry a function result".to_owned(),
                ));
            }
            (ChatMessageBody::FunctionCall(call), _) => (
                ASSISTANT,
                AnthropicBlock::ToolUse {
                    id: ledger.issue(call),
                    name: call.name.to_string(),
                    input: call.arguments.to_json_value()?,
                },
            ),
            (ChatMessageBody::FunctionResult(result), _) => (
                USER,
                AnthropicBlock::ToolResult {
                    tool_use_id: ledger.answer(result)?,
                    content: result.result.as_str().to_owned(),
                },
            ),
        };

        match messages.last_mut() {
            Some(last) if last.role == role => last.content.push(block),
            _ => messages.push(AnthropicMessage {
                role: role.to_owned(),
                content: vec![block],
            }),
        }
    }

    let (temperature, top_p) = parameters
        .sampling
        .map_or((None, None), |s| (s.temperature(), s.top_p()));

    Ok(AnthropicRequest {
        model: model.name().to_owned(),
        max_tokens: parameters
            .token_limit
            .fixed()
            .unwrap_or_else(|| model.max_output_tokens()),
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages,
        temperature,
        top_p,
        stop_sequences: parameters.stops.clone(),
        tools: functions.iter().map(Into::into).collect(),
    })
}

fn stop_reason(reason: Option<String>) -> Option<StopReason> {
    reason.map(|reason| match reason.as_str() {
        "end_turn" => StopReason::EndOfTurn,
        "max_tokens" => StopReason::MaxTokens,
        "stop_sequence" => StopReason::StopSequence,
        "tool_use" => StopReason::FunctionCall,
        "refusal" => StopReason::ContentFilter,
        _ => StopReason::Other(reason),
    })
}

/// Map a Messages response onto the prompt it answers
///
/// Text blocks are concatenated into the assistant message. Tool inputs
/// arrive as JSON objects and are kept structured.
pub fn chat_completion(
    response: AnthropicResponse,
    prompt: &ChatPrompt,
    functions: &[ChatFunctionDefinition],
) -> Result<ChatCompletion> {
    if response.role != ASSISTANT {
        return Err(LoomError::InvalidResponse(format!(
            "expected an assistant message, got role '{}'",
            response.role
        )));
    }

    let mut text = String::new();
    let mut function_calls = Vec::new();

    for block in response.content {
        match block {
            AnthropicBlock::Text { text: part } => text.push_str(&part),
            AnthropicBlock::ToolUse { ref id, ref name, ref input } => {
                let raw = serde_json::to_value(&block).map_err(|e| LoomError::Internal(e.into()))?;
                let arguments = match input {
                    serde_json::Value::Object(map) => Arguments::Structured(map.clone()),
                    other => Arguments::Undecoded(other.to_string()),
                };
                let name = name.as_str().into();
                let context = call_context(functions, &name, raw);
                function_calls.push(
                    ChatFunctionCall::new(name, arguments)
                        .with_function_id(id.clone())
                        .with_context(context),
                );
            }
            AnthropicBlock::ToolResult { .. } => {
                tracing::debug!(response = %response.id, "ignoring tool_result block in response");
            }
        }
    }

    Ok(ChatCompletion {
        prompt: prompt.messages.clone(),
        message: ChatMessage::assistant(text),
        function_calls,
        stop_reason: stop_reason(response.stop_reason),
        model: Some(ModelIdentifier::new(ModelProvider::Anthropic, response.model)),
    })
}
