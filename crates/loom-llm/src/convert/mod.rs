//! Mapping between prompts/completions and vendor wire formats

pub mod anthropic;
pub mod openai;

use loom_core::{
    ChatCompletionParameters, ChatFunctionCall, ChatFunctionDefinition, ChatPrompt, FunctionCallIdKey, FunctionName,
    LoomError, PromptContextValues, ProviderMetadataKey, Result, ResultOfFunctionCall, ensure_unique_names,
};

/// Functions offered for one request
///
/// Parameter-supplied definitions come first, followed by those attached to
/// the prompt context; a definition present in both is sent once.
///
/// # Errors
///
/// `InvalidRequest` if two different definitions share a name.
pub fn offered_functions(
    prompt: &ChatPrompt,
    parameters: &ChatCompletionParameters,
) -> Result<Vec<ChatFunctionDefinition>> {
    let mut functions = parameters.functions.clone();
    for function in prompt.functions() {
        if !functions.contains(function) {
            functions.push(function.clone());
        }
    }

    ensure_unique_names(&functions)?;
    Ok(functions)
}

/// Side-channel values attached to a call decoded from a vendor response
pub(crate) fn call_context(
    functions: &[ChatFunctionDefinition],
    name: &FunctionName,
    raw: serde_json::Value,
) -> PromptContextValues {
    let mut context = PromptContextValues::new().with::<ProviderMetadataKey>(raw);
    if let Some(function) = functions.iter().find(|f| &f.name == name) {
        context.insert::<FunctionCallIdKey>(function.id);
    }
    context
}

/// Tracks call ids while a conversation is encoded
///
/// Both vendors require every result to reference the id of the call it
/// answers. Calls that arrived without an id get a synthetic one, and results
/// without an id are matched to an unanswered call by name.
#[derive(Debug, Default)]
pub(crate) struct CallLedger {
    pending: Vec<(FunctionName, String)>,
    issued: usize,
}

impl CallLedger {
    /// Id to send for `call`
    pub(crate) fn issue(&mut self, call: &ChatFunctionCall) -> String {
        let id = call
            .function_id
            .clone()
            .unwrap_or_else(|| format!("loom_call_{}", self.issued));
        self.issued += 1;
        self.pending.push((call.name.clone(), id.clone()));
        id
    }

    /// Id of the call `result` answers
    ///
    /// Fails with `UnknownFunctionResult` when no unanswered call carries the
    /// result's id or name.
    pub(crate) fn answer(&mut self, result: &ResultOfFunctionCall) -> Result<String> {
        if let Some(id) = &result.function_id {
            let index = self
                .pending
                .iter()
                .position(|(_, pending)| pending == id)
                .ok_or_else(|| LoomError::UnknownFunctionResult {
                    name: result.name.clone(),
                })?;
            return Ok(self.pending.remove(index).1);
        }

        let mut matching = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| name == &result.name)
            .map(|(index, _)| index);

        match (matching.next(), matching.next()) {
            (Some(index), None) => Ok(self.pending.remove(index).1),
            (Some(_), Some(_)) => Err(LoomError::AmbiguousFunctionResult {
                name: result.name.clone(),
            }),
            (None, _) => Err(LoomError::UnknownFunctionResult {
                name: result.name.clone(),
            }),
        }
    }
}
