use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use loom_core::{ModelIdentifier, Sampling, TokenLimit};

/// Loom prompt runner
#[derive(Debug, Parser)]
#[command(name = "loom", about = "Complete text and chat prompts against configured LLM providers")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "loom.toml", env = "LOOM_CONFIG")]
    pub config: PathBuf,

    /// Log filter directive, e.g. `loom_llm=debug`
    #[arg(long, default_value = "warn", env = "LOOM_LOG")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Continue a text prefix
    Text {
        /// Text the model continues
        prefix: String,

        #[command(flatten)]
        options: CompletionOptions,
    },
    /// Ask a single chat question
    Chat {
        /// User message
        message: String,

        /// System message sent before the user message
        #[arg(long)]
        system: Option<String>,

        #[command(flatten)]
        options: CompletionOptions,
    },
}

/// Flags shared by both prompt kinds
#[derive(Debug, ClapArgs)]
pub struct CompletionOptions {
    /// Model as `provider/name[@revision]`; selects the provider too
    #[arg(short, long)]
    pub model: Option<ModelIdentifier>,

    /// Maximum tokens to generate; the model's ceiling when omitted
    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long, conflicts_with = "top_p")]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub top_p: Option<f64>,

    /// Stop sequence, repeatable
    #[arg(long = "stop")]
    pub stops: Vec<String>,
}

impl CompletionOptions {
    pub fn token_limit(&self) -> TokenLimit {
        self.max_tokens.map_or(TokenLimit::Max, TokenLimit::Fixed)
    }

    pub fn sampling(&self) -> Option<Sampling> {
        self.temperature
            .map(Sampling::Temperature)
            .or_else(|| self.top_p.map(Sampling::TopP))
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use loom_core::ModelProvider;

    use super::*;

    #[test]
    fn definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn chat_with_model_and_sampling() {
        let args = Args::try_parse_from([
            "loom",
            "chat",
            "2+2?",
            "--system",
            "You are helpful",
            "--model",
            "anthropic/claude-3-5-haiku-latest",
            "--temperature",
            "0.2",
        ])
        .unwrap();

        let Command::Chat { message, system, options } = args.command else {
            panic!("expected chat command");
        };
        assert_eq!(message, "2+2?");
        assert_eq!(system.as_deref(), Some("You are helpful"));
        assert_eq!(options.model.as_ref().unwrap().provider, ModelProvider::Anthropic);
        assert_eq!(options.sampling(), Some(Sampling::Temperature(0.2)));
        assert_eq!(options.token_limit(), TokenLimit::Max);
    }

    #[test]
    fn temperature_and_top_p_conflict() {
        let result = Args::try_parse_from(["loom", "text", "Once", "--temperature", "1", "--top-p", "0.9"]);
        assert!(result.is_err());
    }

    #[test]
    fn repeatable_stops() {
        let args = Args::try_parse_from(["loom", "text", "Once", "--stop", "\n", "--stop", "END", "--max-tokens", "16"])
            .unwrap();
        let Command::Text { options, .. } = args.command else {
            panic!("expected text command");
        };
        assert_eq!(options.stops, ["\n", "END"]);
        assert_eq!(options.token_limit(), TokenLimit::Fixed(16));
    }
}
