//! Pairing function results with the calls they answer

use async_trait::async_trait;
use futures_util::future::try_join_all;

use crate::error::{LoomError, Result};
use crate::function::{ChatFunctionCall, FunctionResult, ResultOfFunctionCall};

/// Pair each result with the call it answers, in call order
///
/// A result carrying a `function_id` matches the call with that id. A result
/// without one matches by name, and only when exactly one unanswered call has
/// that name. Calls left unanswered are omitted from the output.
///
/// # Errors
///
/// - `UnknownFunctionResult` when a result matches no call
/// - `AmbiguousFunctionResult` when a name-only result fits several calls
/// - `InvalidRequest` when a call is answered twice
pub fn match_results<'c, 'r>(
    calls: &'c [ChatFunctionCall],
    results: &'r [ResultOfFunctionCall],
) -> Result<Vec<(&'c ChatFunctionCall, &'r ResultOfFunctionCall)>> {
    let mut answers: Vec<Option<&'r ResultOfFunctionCall>> = vec![None; calls.len()];

    for result in results {
        let index = match &result.function_id {
            Some(id) => calls
                .iter()
                .position(|call| call.function_id.as_deref() == Some(id.as_str()))
                .ok_or_else(|| LoomError::UnknownFunctionResult {
                    name: result.name.clone(),
                })?,
            None => match_by_name(calls, &answers, result)?,
        };

        if answers[index].is_some() {
            return Err(LoomError::InvalidRequest(format!(
                "function call {} is answered more than once",
                calls[index].name
            )));
        }
        answers[index] = Some(result);
    }

    Ok(calls
        .iter()
        .zip(answers)
        .filter_map(|(call, answer)| answer.map(|result| (call, result)))
        .collect())
}

fn match_by_name(
    calls: &[ChatFunctionCall],
    answers: &[Option<&ResultOfFunctionCall>],
    result: &ResultOfFunctionCall,
) -> Result<usize> {
    let named: Vec<usize> = calls
        .iter()
        .enumerate()
        .filter(|(_, call)| call.name == result.name)
        .map(|(index, _)| index)
        .collect();

    let outstanding: Vec<usize> = named.iter().copied().filter(|&i| answers[i].is_none()).collect();

    match outstanding.as_slice() {
        [index] => Ok(*index),
        [] if named.is_empty() => Err(LoomError::UnknownFunctionResult {
            name: result.name.clone(),
        }),
        [] => Err(LoomError::InvalidRequest(format!(
            "function call {} is answered more than once",
            result.name
        ))),
        _ => Err(LoomError::AmbiguousFunctionResult {
            name: result.name.clone(),
        }),
    }
}

/// Executes function calls on behalf of the caller
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    /// Run `call` and return its raw output
    async fn invoke(&self, call: &ChatFunctionCall) -> Result<FunctionResult>;
}

/// Invoke every call concurrently, returning results in call order
///
/// # Errors
///
/// The first invocation error.
pub async fn invoke_all<I>(invoker: &I, calls: &[ChatFunctionCall]) -> Result<Vec<ResultOfFunctionCall>>
where
    I: FunctionInvoker + ?Sized,
{
    try_join_all(calls.iter().map(|call| async move {
        tracing::debug!(function = %call.name, id = ?call.function_id, "invoking function");
        let result = invoker.invoke(call).await?;
        Ok::<_, LoomError>(ResultOfFunctionCall::answering(call, result))
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;

    fn call(name: &str, id: Option<&str>) -> ChatFunctionCall {
        let call = ChatFunctionCall::new(name, Arguments::default());
        match id {
            Some(id) => call.with_function_id(id),
            None => call,
        }
    }

    #[test]
    fn matches_by_id_in_call_order() {
        let calls = [call("weather", Some("a")), call("weather", Some("b"))];
        let results = [
            ResultOfFunctionCall::new("weather", "rome").with_function_id("b"),
            ResultOfFunctionCall::new("weather", "paris").with_function_id("a"),
        ];

        let pairs = match_results(&calls, &results).unwrap();
        assert_eq!(pairs[0].1.result.as_str(), "paris");
        assert_eq!(pairs[1].1.result.as_str(), "rome");
    }

    #[test]
    fn unique_name_matches() {
        let calls = [call("weather", None), call("time", None)];
        let results = [ResultOfFunctionCall::new("time", "noon")];

        let pairs = match_results(&calls, &results).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.name.as_str(), "time");
    }

    #[test]
    fn shared_name_is_ambiguous() {
        let calls = [call("weather", None), call("weather", None)];
        let results = [ResultOfFunctionCall::new("weather", "21C")];

        let err = match_results(&calls, &results).unwrap_err();
        assert!(matches!(err, LoomError::AmbiguousFunctionResult { .. }));
    }

    #[test]
    fn unknown_result() {
        let calls = [call("weather", Some("a"))];

        let by_id = [ResultOfFunctionCall::new("weather", "x").with_function_id("zzz")];
        assert!(matches!(
            match_results(&calls, &by_id).unwrap_err(),
            LoomError::UnknownFunctionResult { .. }
        ));

        let by_name = [ResultOfFunctionCall::new("time", "x")];
        assert!(matches!(
            match_results(&calls, &by_name).unwrap_err(),
            LoomError::UnknownFunctionResult { .. }
        ));
    }

    #[test]
    fn double_answer_rejected() {
        let calls = [call("weather", None)];
        let results = [
            ResultOfFunctionCall::new("weather", "1"),
            ResultOfFunctionCall::new("weather", "2"),
        ];
        assert!(matches!(
            match_results(&calls, &results).unwrap_err(),
            LoomError::InvalidRequest(_)
        ));
    }

    struct Echo;

    #[async_trait]
    impl FunctionInvoker for Echo {
        async fn invoke(&self, call: &ChatFunctionCall) -> Result<FunctionResult> {
            Ok(FunctionResult::new(call.arguments.to_json_string()))
        }
    }

    #[tokio::test]
    async fn invoke_all_answers_each_call() {
        let calls = [
            ChatFunctionCall::new("a", Arguments::Undecoded("1".to_owned())).with_function_id("x"),
            ChatFunctionCall::new("b", Arguments::Undecoded("2".to_owned())),
        ];

        let results = invoke_all(&Echo, &calls).await.unwrap();
        assert_eq!(results[0].function_id.as_deref(), Some("x"));
        assert_eq!(results[1].result.as_str(), "2");
        assert_eq!(match_results(&calls, &results).unwrap().len(), 2);
    }
}
