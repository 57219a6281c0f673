//! Engine configuration.
//!
//! Loaded from a TOML file with `[model]`, `[narration]` and `[catalog]`
//! sections. Every field has a default except the model name, which must
//! come from the file, the `STORY_MODEL` environment variable or the
//! command line.

use crate::narrator::{ChatGenerator, NarratorConfig, RecapPolicy, DEFAULT_ENDING_MARKER};
use chat::Chat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable overriding `model.name`.
pub const MODEL_ENV: &str = "STORY_MODEL";
/// Environment variable overriding `model.base_url`.
pub const BASE_URL_ENV: &str = "STORY_BASE_URL";
/// Where the binary looks for a config file when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/story.toml";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The `[model]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Model to generate with. Required.
    pub name: Option<String>,

    /// OpenAI-compatible endpoint.
    pub base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Maximum tokens per completion.
    pub max_tokens: usize,

    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: None,
            base_url: chat::DEFAULT_BASE_URL.to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 2048,
            temperature: Some(0.8),
        }
    }
}

/// The `[narration]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrationSettings {
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    pub recap: RecapPolicy,
    pub ending_marker: String,
    pub extra_instruction: Option<String>,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 1,
            retry_base_delay_ms: 500,
            recap: RecapPolicy::default(),
            ending_marker: DEFAULT_ENDING_MARKER.to_string(),
            extra_instruction: None,
        }
    }
}

/// The `[catalog]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSettings {
    pub path: PathBuf,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/stories.csv"),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoryConfig {
    pub model: ModelConfig,
    pub narration: NarrationSettings,
    pub catalog: CatalogSettings,
}

impl StoryConfig {
    /// Load a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path`, or the default config file when it exists, or the
    /// defaults. Environment overrides are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `STORY_MODEL` and `STORY_BASE_URL`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(model = %model, "model overridden from environment");
            self.model.name = Some(model);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(url = %url, "base URL overridden from environment");
            self.model.base_url = url;
        }
    }

    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model.name = Some(name.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.model.base_url = url.into();
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog.path = path.into();
        self
    }

    pub fn with_recap(mut self, recap: RecapPolicy) -> Self {
        self.narration.recap = recap;
        self
    }

    /// Check the configuration before anything is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model_name()?;

        if self.model.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("model.base_url is empty".into()));
        }
        if self.model.max_tokens == 0 {
            return Err(ConfigError::Invalid("model.max_tokens must be positive".into()));
        }
        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "model.temperature must be between 0 and 2, got {t}"
                )));
            }
        }
        if self.narration.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "narration.timeout_secs must be positive".into(),
            ));
        }
        if self.narration.ending_marker.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "narration.ending_marker is empty".into(),
            ));
        }
        Ok(())
    }

    /// The configured model name.
    pub fn model_name(&self) -> Result<&str, ConfigError> {
        self.model
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "no model configured: set model.name or {MODEL_ENV}"
                ))
            })
    }

    pub fn narrator_config(&self) -> NarratorConfig {
        let settings = &self.narration;
        let mut config = NarratorConfig::default()
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_retries(
                settings.max_retries,
                Duration::from_millis(settings.retry_base_delay_ms),
            )
            .with_recap(settings.recap)
            .with_ending_marker(settings.ending_marker.trim());
        if let Some(extra) = &settings.extra_instruction {
            config = config.with_extra_instruction(extra.clone());
        }
        config
    }

    /// Build the chat client.
    ///
    /// The key comes from the variable named by `model.api_key_env`. Local
    /// servers accept any key, so a missing key is only an error for remote
    /// endpoints.
    pub fn chat_client(&self) -> Result<Chat, ConfigError> {
        self.chat_client_with(|key| std::env::var(key).ok())
    }

    fn chat_client_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Chat, ConfigError> {
        let model = self.model_name()?;
        let base_url = self.model.base_url.trim();

        let api_key = match lookup(&self.model.api_key_env).filter(|k| !k.is_empty()) {
            Some(key) => key,
            None if is_local(base_url) => chat::DEFAULT_API_KEY.to_string(),
            None => {
                return Err(ConfigError::Invalid(format!(
                    "{} is not set and {base_url} is not a local server",
                    self.model.api_key_env
                )))
            }
        };

        let chat = Chat::new(api_key)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?
            .with_base_url(base_url)
            .with_model(model);
        Ok(chat)
    }

    /// Build the production generator.
    pub fn generator(&self) -> Result<ChatGenerator, ConfigError> {
        let mut generator =
            ChatGenerator::new(self.chat_client()?).with_max_tokens(self.model.max_tokens);
        if let Some(t) = self.model.temperature {
            generator = generator.with_temperature(t);
        }
        Ok(generator)
    }
}

fn is_local(base_url: &str) -> bool {
    let host = base_url
        .split("://")
        .nth(1)
        .unwrap_or(base_url)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    matches!(host, "localhost" | "127.0.0.1" | "0.0.0.0")
}
