//! Builds the completion provider named by `providers.default_provider`.

use anyhow::{Context, Result};
use tracing::debug;
use vox_config::{Config, ProviderConfigRef};
use vox_providers::{GeminiProvider, OpenAIProvider, ProviderRegistry};

/// Register the configured default provider and mark it as the default.
///
/// Only the default is constructed: the planner talks to one provider, and
/// an unused entry with no API key must not block startup.
pub fn register_providers(config: &Config) -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    let reference = config.providers.default_provider.clone();
    let (_, config_name) = Config::parse_provider_reference(&reference)?;

    match config.get_default_provider_config()? {
        ProviderConfigRef::Gemini(gemini_config) => {
            let api_key = gemini_config.resolved_api_key().with_context(|| {
                format!(
                    "No API key for '{}': set api_key in the config or GOOGLE_API_KEY",
                    reference
                )
            })?;
            let provider = GeminiProvider::new_with_name(
                format!("gemini.{}", config_name),
                api_key,
                Some(gemini_config.model.clone()),
                gemini_config.max_tokens,
                gemini_config.temperature,
            )?;
            registry.register(provider);
        }
        ProviderConfigRef::OpenAI(openai_config) => {
            let provider = OpenAIProvider::new_with_name(
                format!("openai.{}", config_name),
                openai_config.resolved_api_key(),
                Some(openai_config.model.clone()),
                openai_config.base_url.clone(),
                openai_config.max_tokens,
                openai_config.temperature,
            )?;
            registry.register(provider);
        }
    }

    debug!("Setting default provider to: {}", reference);
    registry.set_default(&reference)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_openai_default() {
        let config = Config::from_toml_str(
            r#"
[providers]
default_provider = "openai.local"

[providers.openai.local]
model = "llama3"
base_url = "http://localhost:11434/v1"
"#,
        )
        .unwrap();

        let registry = register_providers(&config).unwrap();
        let provider = registry.get(None).unwrap();
        assert_eq!(provider.name(), "openai.local");
        assert_eq!(provider.model(), "llama3");
        assert_eq!(registry.list_providers(), vec!["openai.local"]);
    }

    #[test]
    fn test_registers_gemini_with_configured_key() {
        let config = Config::from_toml_str(
            r#"
[providers]
default_provider = "gemini.default"

[providers.gemini.default]
api_key = "test-key"
"#,
        )
        .unwrap();

        let registry = register_providers(&config).unwrap();
        let provider = registry.get(Some("gemini.default")).unwrap();
        assert_eq!(provider.model(), "gemma-3-4b-it");
        assert_eq!(provider.temperature(), 0.0);
    }
}
