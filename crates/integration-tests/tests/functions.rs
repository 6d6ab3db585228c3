mod harness;

use async_trait::async_trait;
use harness::config::ConfigBuilder;
use harness::mock_vendor::MockVendor;
use loom_core::{
    ChatCompletionParameters, ChatFunctionCall, ChatFunctionDefinition, ChatMessage, ChatPrompt, FunctionCallIdKey,
    FunctionInvoker, FunctionResult, JsonSchema, LoomError, Result, StopReason, invoke_all,
};
use loom_llm::HandlerRegistry;
#[allow(dead_code)]
#[derive(schemars::JsonSchema)]
struct WeatherArgs {
    city: String,
}

struct Weather;

#[async_trait]
impl FunctionInvoker for Weather {
    async fn invoke(&self, call: &ChatFunctionCall) -> Result<FunctionResult> {
        // Anthropic hands back structured arguments, which only decode to a JSON value
        let args: serde_json::Value = call.decode_arguments()?;
        match args["city"].as_str().unwrap_or_default() {
            "Paris" => Ok(FunctionResult::new("21C")),
            other => Err(LoomError::InvalidRequest(format!("no weather for {other}"))),
        }
    }
}

fn weather() -> ChatFunctionDefinition {
    ChatFunctionDefinition::new("get_weather", "Current weather for a city", JsonSchema::for_type::<WeatherArgs>())
}

async fn round_trip(registry: &HandlerRegistry, mock: &MockVendor) -> Vec<serde_json::Value> {
    let weather = weather();
    let prompt = ChatPrompt::new(vec![ChatMessage::user("What is the weather in Paris?")])
        .with_functions(vec![weather.clone()]);
    let parameters = ChatCompletionParameters::default();

    let first = registry.complete(&prompt, &parameters).await.unwrap();
    assert_eq!(first.stop_reason, Some(StopReason::FunctionCall));

    let call = first.function_call().unwrap();
    assert_eq!(call.name.as_str(), "get_weather");
    assert_eq!(call.context.get::<FunctionCallIdKey>(), Some(&weather.id));

    let results = invoke_all(&Weather, &first.function_calls).await.unwrap();
    let next = prompt.appending_turn(&first, &results).unwrap();
    assert_eq!(prompt.messages.len(), 1);

    let second = registry.complete(&next, &parameters).await.unwrap();
    assert_eq!(second.text(), Some("It is 21C in Paris."));
    assert!(second.function_calls.is_empty());

    mock.requests()
}

#[tokio::test]
async fn openai_function_call_round_trip() {
    let mock = MockVendor::start().await.unwrap();
    let config = ConfigBuilder::new().with_openai_provider("openai", &mock.base_url()).build();
    let registry = HandlerRegistry::from_config(&config.llm).unwrap();

    let requests = round_trip(&registry, &mock).await;
    assert_eq!(requests.len(), 2);

    assert_eq!(requests[0]["tools"][0]["function"]["name"], "get_weather");
    let messages = requests[1]["messages"].as_array().unwrap();
    assert_eq!(messages[1]["tool_calls"][0]["id"], "call_1");
    assert_eq!(messages[2]["role"], "tool");
    assert_eq!(messages[2]["tool_call_id"], "call_1");
    assert_eq!(messages[2]["content"], "21C");
}

#[tokio::test]
async fn anthropic_function_call_round_trip() {
    let mock = MockVendor::start().await.unwrap();
    let config = ConfigBuilder::new()
        .with_anthropic_provider("claude", &mock.base_url())
        .build();
    let registry = HandlerRegistry::from_config(&config.llm).unwrap();

    let requests = round_trip(&registry, &mock).await;
    assert_eq!(requests.len(), 2);

    let messages = requests[1]["messages"].as_array().unwrap();
    let assistant = messages[1]["content"].as_array().unwrap();
    assert_eq!(assistant[0]["text"], "Let me check.");
    assert_eq!(assistant[1]["type"], "tool_use");
    assert_eq!(assistant[1]["input"]["city"], "Paris");
    assert_eq!(messages[2]["content"][0]["tool_use_id"], "toolu_1");
}

#[tokio::test]
async fn duplicate_function_names_fail_before_sending() {
    let mock = MockVendor::start().await.unwrap();
    let config = ConfigBuilder::new().with_openai_provider("openai", &mock.base_url()).build();
    let registry = HandlerRegistry::from_config(&config.llm).unwrap();

    let prompt = ChatPrompt::new(vec![ChatMessage::user("Weather?")]).with_functions(vec![weather()]);
    let parameters = ChatCompletionParameters::default().with_functions(vec![weather()]);

    let err = registry.complete(&prompt, &parameters).await.unwrap_err();
    assert!(matches!(err, LoomError::InvalidRequest(_)));
    assert_eq!(mock.request_count(), 0);
}
