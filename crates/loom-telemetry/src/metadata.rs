use loom_config::TelemetryConfig;
use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;

/// Resource describing this process, attached to every exported span
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    let service = [
        KeyValue::new(semconv::SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
    ];
    let extra = config
        .resource_attributes
        .iter()
        .map(|(key, value)| KeyValue::new(key.clone(), value.clone()));

    Resource::builder().with_attributes(service.into_iter().chain(extra)).build()
}

#[cfg(test)]
mod tests {
    use opentelemetry::{Key, Value};

    use super::*;

    #[test]
    fn carries_service_and_custom_attributes() {
        let mut config = TelemetryConfig {
            service_name: "loom-cli".to_owned(),
            ..TelemetryConfig::default()
        };
        config
            .resource_attributes
            .insert("deployment.environment".to_owned(), "test".to_owned());

        let resource = build_resource(&config);
        assert_eq!(
            resource.get(&Key::new(semconv::SERVICE_NAME)),
            Some(Value::from("loom-cli"))
        );
        assert_eq!(
            resource.get(&Key::new("deployment.environment")),
            Some(Value::from("test"))
        );
    }
}
