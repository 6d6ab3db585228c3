//! Prompts to `OpenAI` requests and responses back to completions

use loom_core::{
    Arguments, ChatCompletion, ChatCompletionParameters, ChatFunctionCall, ChatFunctionDefinition, ChatMessage,
    ChatMessageBody, ChatPrompt, ChatRole, LoomError, ModelIdentifier, ModelProvider, Result, Sampling, StopReason,
    TextCompletion, TextCompletionParameters, TextPrompt, VendorModel,
};

use super::{CallLedger, call_context};
use crate::model::OpenAiModel;
use crate::protocol::openai::{
    OpenAiChatRequest, OpenAiChatResponse, OpenAiCompletionRequest, OpenAiCompletionResponse, OpenAiFunction,
    OpenAiFunctionCall, OpenAiMessage, OpenAiTool, OpenAiToolCall,
};

/// Most stop sequences the API accepts
const MAX_STOPS: usize = 4;

const FUNCTION: &str = "function";

impl From<&ChatFunctionDefinition> for OpenAiTool {
    fn from(function: &ChatFunctionDefinition) -> Self {
        Self {
            tool_type: FUNCTION.to_owned(),
            function: OpenAiFunction {
                name: function.name.to_string(),
                description: Some(function.context.clone()).filter(|d| !d.is_empty()),
                parameters: function.parameters.as_value().clone(),
            },
        }
    }
}

fn sampling(sampling: Option<Sampling>) -> (Option<f64>, Option<f64>) {
    sampling.map_or((None, None), |s| (s.temperature(), s.top_p()))
}

fn check_stops(stops: &[String]) -> Result<()> {
    if stops.len() > MAX_STOPS {
        return Err(LoomError::InvalidRequest(format!(
            "at most {MAX_STOPS} stop sequences are supported, got {}",
            stops.len()
        )));
    }
    Ok(())
}

/// Build a chat request
pub fn chat_request(
    model: OpenAiModel,
    prompt: &ChatPrompt,
    parameters: &ChatCompletionParameters,
    functions: &[ChatFunctionDefinition],
) -> Result<OpenAiChatRequest> {
    check_stops(&parameters.stops)?;
    let (temperature, top_p) = sampling(parameters.sampling);

    Ok(OpenAiChatRequest {
        model: model.name().to_owned(),
        messages: encode_messages(&prompt.messages)?,
        max_completion_tokens: parameters.token_limit.fixed(),
        temperature,
        top_p,
        stop: parameters.stops.clone(),
        tools: functions.iter().map(Into::into).collect(),
    })
}

fn encode_messages(messages: &[ChatMessage]) -> Result<Vec<OpenAiMessage>> {
    let mut ledger = CallLedger::default();
    let mut encoded: Vec<OpenAiMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        match &message.body {
            ChatMessageBody::Text(text) => {
                let role = match message.role {
                    ChatRole::System => "system",
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                    ChatRole::Function => {
                        return Err(LoomError::InvalidRequest(
                            "function messages must carry a function result".to_owned(),
                        ));
                    }
                };
                encoded.push(OpenAiMessage::text(role, text.as_str()));
            }
            ChatMessageBody::FunctionCall(call) => {
                let tool_call = OpenAiToolCall {
                    id: ledger.issue(call),
                    tool_type: FUNCTION.to_owned(),
                    function: OpenAiFunctionCall {
                        name: call.name.to_string(),
                        arguments: call.arguments.to_json_string(),
                    },
                };

                // Parallel calls travel in a single assistant message
                match encoded.last_mut() {
                    Some(last) if last.role == "assistant" => last.tool_calls.push(tool_call),
                    _ => encoded.push(OpenAiMessage {
                        role: "assistant".to_owned(),
                        content: None,
                        tool_calls: vec![tool_call],
                        tool_call_id: None,
                    }),
                }
            }
            ChatMessageBody::FunctionResult(result) => encoded.push(OpenAiMessage {
                role: "tool".to_owned(),
                content: Some(result.result.as_str().to_owned()),
                tool_calls: Vec::new(),
                tool_call_id: Some(ledger.answer(result)?),
            }),
        }
    }

    Ok(encoded)
}

fn stop_reason(finish_reason: Option<String>) -> Option<StopReason> {
    finish_reason.map(|reason| match reason.as_str() {
        "stop" => StopReason::EndOfTurn,
        "length" => StopReason::MaxTokens,
        "tool_calls" | "function_call" => StopReason::FunctionCall,
        "content_filter" => StopReason::ContentFilter,
        _ => StopReason::Other(reason),
    })
}

/// Map a chat response onto the prompt it answers
pub fn chat_completion(
    response: OpenAiChatResponse,
    prompt: &ChatPrompt,
    functions: &[ChatFunctionDefinition],
) -> Result<ChatCompletion> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LoomError::InvalidResponse("response contains no choices".to_owned()))?;

    let function_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|tool_call| {
            let raw = serde_json::to_value(&tool_call).map_err(|e| LoomError::Internal(e.into()))?;
            let name = tool_call.function.name.into();
            let context = call_context(functions, &name, raw);
            Ok(
                ChatFunctionCall::new(name, Arguments::Undecoded(tool_call.function.arguments))
                    .with_function_id(tool_call.id)
                    .with_context(context),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChatCompletion {
        prompt: prompt.messages.clone(),
        message: ChatMessage::assistant(choice.message.content.unwrap_or_default()),
        function_calls,
        stop_reason: stop_reason(choice.finish_reason),
        model: Some(ModelIdentifier::new(ModelProvider::OpenAi, response.model)),
    })
}

/// Build a legacy completions request
pub fn text_request(
    model: OpenAiModel,
    prompt: &TextPrompt,
    parameters: &TextCompletionParameters,
) -> Result<OpenAiCompletionRequest> {
    check_stops(&parameters.stops)?;
    let (temperature, top_p) = sampling(parameters.sampling);

    Ok(OpenAiCompletionRequest {
        model: model.name().to_owned(),
        prompt: prompt.prefix.as_str().to_owned(),
        max_tokens: parameters.token_limit.fixed(),
        temperature,
        top_p,
        stop: parameters.stops.clone(),
    })
}

/// Map a legacy completions response onto the prompt it continues
pub fn text_completion(response: OpenAiCompletionResponse, prompt: &TextPrompt) -> Result<TextCompletion> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LoomError::InvalidResponse("response contains no choices".to_owned()))?;

    Ok(TextCompletion {
        prefix: prompt.prefix.clone(),
        text: choice.text,
        stop_reason: stop_reason(choice.finish_reason),
        model: Some(ModelIdentifier::new(ModelProvider::OpenAi, response.model)),
    })
}
