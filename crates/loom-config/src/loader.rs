use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if
    /// [`Config::from_toml_str`] rejects its contents
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let config = Self::from_toml_str(&raw)?;
        tracing::debug!(path = %path.display(), providers = config.llm.providers.len(), "loaded configuration");

        Ok(config)
    }

    /// Parse and validate configuration text
    ///
    /// Expands `{{ env.NAME }}` placeholders before parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, TOML parsing or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).context("config variable expansion failed")?;
        let config: Self = toml::from_str(&expanded).context("failed to parse config")?;

        config.validate()?;

        Ok(config)
    }

    /// Check the configuration for internal consistency
    ///
    /// # Errors
    ///
    /// Returns an error if no adapter is configured, the default adapter does
    /// not exist, two adapters share a vendor type, or a timeout is malformed
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_has_providers()?;
        self.validate_default_provider()?;
        self.validate_providers()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_has_providers(&self) -> anyhow::Result<()> {
        if self.llm.providers.is_empty() {
            anyhow::bail!("at least one provider must be configured under [llm.providers]");
        }
        Ok(())
    }

    fn validate_default_provider(&self) -> anyhow::Result<()> {
        if let Some(ref name) = self.llm.default_provider
            && !self.llm.providers.contains_key(name)
        {
            anyhow::bail!("default_provider '{name}' is not a configured provider");
        }
        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        let mut seen = HashMap::new();

        for (name, provider) in &self.llm.providers {
            if let Some(previous) = seen.insert(provider.provider_type, name) {
                anyhow::bail!(
                    "providers '{previous}' and '{name}' both use type '{}'",
                    provider.provider_type.as_str()
                );
            }

            provider
                .timeout()
                .with_context(|| format!("provider '{name}'"))?;
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        let Some(ref telemetry) = self.telemetry else {
            return Ok(());
        };

        if let Some(ref tracing_config) = telemetry.tracing
            && !(0.0..=1.0).contains(&tracing_config.sampling_rate)
        {
            anyhow::bail!("telemetry.tracing.sampling_rate must be between 0.0 and 1.0");
        }

        Ok(())
    }
}
