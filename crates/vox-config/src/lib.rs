use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Locations searched, in order, when no explicit config path is given
const DEFAULT_CONFIG_PATHS: [&str; 3] = ["./vox.toml", "~/.config/vox/config.toml", "~/.vox.toml"];

pub const DEFAULT_MODEL: &str = "gemma-3-4b-it";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Provider configuration with named configs per provider type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Default provider in format "<provider_type>.<config_name>"
    pub default_provider: String,

    /// Named Gemini API provider configs (Gemini and Gemma models)
    #[serde(default)]
    pub gemini: HashMap<String, GeminiConfig>,

    /// Named OpenAI / OpenAI-compatible provider configs
    #[serde(default)]
    pub openai: HashMap<String, OpenAIConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Empty means "read GOOGLE_API_KEY or GEMINI_API_KEY from the environment"
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Empty means "read OPENAI_API_KEY from the environment"; local servers
    /// usually need none
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Plan generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Upper bound on a single completion call
    pub timeout_seconds: u64,
    /// Total attempts for recoverable transport failures (1 = no retry)
    pub max_retry_attempts: u32,
    /// Replacement routing policy document; the built-in policy is used when unset
    pub policy_path: Option<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retry_attempts: 3,
            policy_path: None,
        }
    }
}

impl PlannerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// The policy path with `~` expanded
    pub fn policy_path(&self) -> Option<PathBuf> {
        self.policy_path
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()))
    }
}

/// Host-side timing used while executing steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Pause after opening the OS launcher, before typing the app name
    pub launcher_open_delay_ms: u64,
    /// Pause after typing the app name, before confirming
    pub launcher_type_delay_ms: u64,
    /// Pause between writing the clipboard and sending the paste chord
    pub paste_delay_ms: u64,
    /// How long the system key stays held after tapping printscreen
    pub chord_hold_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            launcher_open_delay_ms: 500,
            launcher_type_delay_ms: 200,
            paste_delay_ms: 200,
            chord_hold_ms: 100,
        }
    }
}

impl GeminiConfig {
    /// The configured key, falling back to the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        non_empty(&self.api_key)
            .or_else(|| env_key("GOOGLE_API_KEY"))
            .or_else(|| env_key("GEMINI_API_KEY"))
    }
}

impl OpenAIConfig {
    /// The configured key, falling back to the environment, else empty
    pub fn resolved_api_key(&self) -> String {
        non_empty(&self.api_key)
            .or_else(|| env_key("OPENAI_API_KEY"))
            .unwrap_or_default()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(&v))
}

impl Default for Config {
    fn default() -> Self {
        let mut gemini_configs = HashMap::new();
        gemini_configs.insert(
            "default".to_string(),
            GeminiConfig {
                api_key: String::new(),
                model: DEFAULT_MODEL.to_string(),
                max_tokens: Some(1024),
                temperature: Some(0.0),
            },
        );

        Self {
            providers: ProvidersConfig {
                default_provider: "gemini.default".to_string(),
                gemini: gemini_configs,
                openai: HashMap::new(),
            },
            planner: PlannerConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

/// Error message for flat provider sections
const FLAT_PROVIDER_FORMAT_ERROR: &str = r#"Your configuration declares provider settings directly under [providers.<type>].

Provider settings must be named, so several configs of one type can coexist:

```toml
[providers]
default_provider = "gemini.default"   # Format: "<provider_type>.<config_name>"

[providers.gemini.default]
api_key = "your-api-key"              # or leave empty and set GOOGLE_API_KEY
model = "gemma-3-4b-it"

[providers.openai.local]
model = "llama3"
base_url = "http://localhost:11434/v1"
```"#;

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config_path_to_load = match config_path {
            Some(path) => {
                if !Path::new(path).exists() {
                    anyhow::bail!("Config file not found: {}", path);
                }
                Some(path.to_string())
            }
            None => DEFAULT_CONFIG_PATHS.iter().find_map(|path| {
                let expanded_path = shellexpand::tilde(path);
                Path::new(expanded_path.as_ref())
                    .exists()
                    .then(|| expanded_path.to_string())
            }),
        };

        let Some(path) = config_path_to_load else {
            // No config anywhere: write the default so users have something to edit
            let default_config = Self::default();

            let config_dir = dirs::home_dir()
                .map(|mut path| {
                    path.push(".config");
                    path.push("vox");
                    path
                })
                .unwrap_or_else(|| PathBuf::from("."));

            std::fs::create_dir_all(&config_dir).ok();

            let config_file = config_dir.join("config.toml");
            match default_config.save(&config_file) {
                Ok(()) => info!("Created default configuration at: {}", config_file.display()),
                Err(e) => warn!("Could not save default config: {}", e),
            }

            return Ok(default_config);
        };

        let config_content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml_str(&config_content)
            .with_context(|| format!("Invalid config file {}", path))
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if Self::is_flat_provider_format(content) {
            anyhow::bail!("{}", FLAT_PROVIDER_FORMAT_ERROR);
        }

        let config: Config = toml::from_str(content)?;
        config.validate_provider_reference(&config.providers.default_provider)?;

        if config.planner.max_retry_attempts == 0 {
            anyhow::bail!("planner.max_retry_attempts must be at least 1");
        }

        Ok(config)
    }

    /// Detect `[providers.gemini]` / `[providers.openai]` carrying settings directly
    fn is_flat_provider_format(content: &str) -> bool {
        let Ok(value) = content.parse::<toml::Value>() else {
            return false;
        };
        let Some(providers) = value.get("providers").and_then(|p| p.as_table()) else {
            return false;
        };

        ["gemini", "openai"].iter().any(|provider_type| {
            providers
                .get(*provider_type)
                .and_then(|section| section.as_table())
                .is_some_and(|table| table.contains_key("model") || table.contains_key("api_key"))
        })
    }

    /// Validate a provider reference (format: "<provider_type>.<config_name>")
    fn validate_provider_reference(&self, reference: &str) -> Result<()> {
        let (provider_type, config_name) = Self::parse_provider_reference(reference)?;

        match provider_type.as_str() {
            "gemini" => {
                if !self.providers.gemini.contains_key(&config_name) {
                    anyhow::bail!(
                        "Provider config 'gemini.{}' not found. Available: {:?}",
                        config_name,
                        self.providers.gemini.keys().collect::<Vec<_>>()
                    );
                }
            }
            "openai" => {
                if !self.providers.openai.contains_key(&config_name) {
                    anyhow::bail!(
                        "Provider config 'openai.{}' not found. Available: {:?}",
                        config_name,
                        self.providers.openai.keys().collect::<Vec<_>>()
                    );
                }
            }
            _ => {
                anyhow::bail!(
                    "Unknown provider type '{}'. Valid types: gemini, openai",
                    provider_type
                );
            }
        }

        Ok(())
    }

    /// Parse a provider reference into (provider_type, config_name)
    pub fn parse_provider_reference(reference: &str) -> Result<(String, String)> {
        let parts: Vec<&str> = reference.split('.').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
            anyhow::bail!(
                "Invalid provider reference '{}'. Expected format: '<provider_type>.<config_name>'",
                reference
            );
        }
        Ok((parts[0].to_string(), parts[1].to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn load_with_overrides(
        config_path: Option<&str>,
        provider_override: Option<String>,
        model_override: Option<String>,
        policy_override: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::load(config_path)?;
        config.apply_overrides(provider_override, model_override, policy_override)?;
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        provider_override: Option<String>,
        model_override: Option<String>,
        policy_override: Option<String>,
    ) -> Result<()> {
        if let Some(provider) = provider_override {
            self.validate_provider_reference(&provider)?;
            self.providers.default_provider = provider;
        }

        // Model override applies to the active provider
        if let Some(model) = model_override {
            let (provider_type, config_name) =
                Self::parse_provider_reference(&self.providers.default_provider)?;

            match provider_type.as_str() {
                "gemini" => {
                    let gemini_config = self
                        .providers
                        .gemini
                        .get_mut(&config_name)
                        .ok_or_else(|| anyhow::anyhow!("Provider config 'gemini.{}' not found.", config_name))?;
                    gemini_config.model = model;
                }
                "openai" => {
                    let openai_config = self
                        .providers
                        .openai
                        .get_mut(&config_name)
                        .ok_or_else(|| anyhow::anyhow!("Provider config 'openai.{}' not found.", config_name))?;
                    openai_config.model = model;
                }
                _ => anyhow::bail!("Unknown provider type: {}", provider_type),
            }
        }

        if let Some(policy) = policy_override {
            self.planner.policy_path = Some(policy);
        }

        Ok(())
    }

    pub fn get_gemini_config(&self, name: &str) -> Option<&GeminiConfig> {
        self.providers.gemini.get(name)
    }

    pub fn get_openai_config(&self, name: &str) -> Option<&OpenAIConfig> {
        self.providers.openai.get(name)
    }

    /// Get the current default provider's config
    pub fn get_default_provider_config(&self) -> Result<ProviderConfigRef<'_>> {
        let (provider_type, config_name) =
            Self::parse_provider_reference(&self.providers.default_provider)?;

        match provider_type.as_str() {
            "gemini" => self
                .get_gemini_config(&config_name)
                .map(ProviderConfigRef::Gemini)
                .ok_or_else(|| anyhow::anyhow!("Gemini config '{}' not found", config_name)),
            "openai" => self
                .get_openai_config(&config_name)
                .map(ProviderConfigRef::OpenAI)
                .ok_or_else(|| anyhow::anyhow!("OpenAI config '{}' not found", config_name)),
            _ => Err(anyhow::anyhow!("Unknown provider type '{}'", provider_type)),
        }
    }
}

/// Reference to a provider configuration
#[derive(Debug)]
pub enum ProviderConfigRef<'a> {
    Gemini(&'a GeminiConfig),
    OpenAI(&'a OpenAIConfig),
}
