#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use args::{Args, Command};
use clap::Parser;
use loom_config::Config;
use loom_core::{
    ChatCompletionParameters, ChatMessage, ChatPrompt, Result, TextCompletionParameters, TextPrompt,
};
use loom_llm::HandlerRegistry;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let _telemetry_guard = loom_telemetry::init(config.telemetry.as_ref(), &args.log_filter)?;

    tracing::debug!(config_path = %args.config.display(), "starting loom");

    let registry = HandlerRegistry::from_config(&config.llm)?;

    // Dropping the completion future cancels the request
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    let outcome = shutdown.run_until_cancelled(run(&registry, args.command)).await;
    registry.shutdown();

    match outcome {
        Some(output) => println!("{}", output?),
        None => tracing::warn!("completion cancelled"),
    }
    Ok(())
}

async fn run(registry: &HandlerRegistry, command: Command) -> Result<String> {
    match command {
        Command::Text { prefix, options } => {
            let mut prompt = TextPrompt::new(prefix);
            if let Some(model) = options.model.clone() {
                prompt = prompt.with_model(model);
            }
            let mut parameters = TextCompletionParameters::default()
                .with_token_limit(options.token_limit())
                .with_stops(options.stops.iter().cloned());
            if let Some(sampling) = options.sampling() {
                parameters = parameters.with_sampling(sampling);
            }

            let completion = registry.complete(&prompt, &parameters).await?;
            tracing::debug!(stop_reason = ?completion.stop_reason, "text completion finished");
            Ok(completion.text)
        }
        Command::Chat { message, system, options } => {
            let mut messages = Vec::with_capacity(2);
            if let Some(system) = system {
                messages.push(ChatMessage::system(system));
            }
            messages.push(ChatMessage::user(message));

            let mut prompt = ChatPrompt::new(messages);
            if let Some(model) = options.model.clone() {
                prompt = prompt.with_model(model);
            }
            let mut parameters = ChatCompletionParameters::default()
                .with_token_limit(options.token_limit())
                .with_stops(options.stops.iter().cloned());
            if let Some(sampling) = options.sampling() {
                parameters = parameters.with_sampling(sampling);
            }

            let completion = registry.complete(&prompt, &parameters).await?;
            tracing::debug!(stop_reason = ?completion.stop_reason, "chat completion finished");
            Ok(completion.text().unwrap_or_default().to_owned())
        }
    }
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
