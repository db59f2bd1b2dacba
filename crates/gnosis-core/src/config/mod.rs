//! Configuration management with file persistence
//!
//! Non-secret settings live in `config.toml`; API keys are read from the
//! environment only and are never serialized.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the embedding provider key
pub const VOYAGE_API_KEY_VAR: &str = "VOYAGE_API_KEY";
/// Environment variable holding the generative model key
pub const CEREBRAS_API_KEY_VAR: &str = "CEREBRAS_API_KEY";
/// Environment variable holding the vector store key (optional)
pub const QDRANT_API_KEY_VAR: &str = "QDRANT_API_KEY";

/// Fragments that mark a secret as an unfilled template value
const PLACEHOLDER_MARKERS: [&str; 5] = ["your_", "xxx", "placeholder", "changeme", "todo"];

/// Gnosis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Read only so that a key left in the file is rejected
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub url: String,
    pub collection: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            embedding: EmbeddingConfig::default(),
            vector_store: VectorStoreConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.voyageai.com/v1".to_string(),
            model: "voyage-3".to_string(),
            dimension: 1024,
            timeout_secs: 30,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url: "http://localhost:6333".to_string(),
            collection: "gnosis_concepts".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.cerebras.ai/v1".to_string(),
            model: "llama-4-scout-17b-16e-instruct".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        ensure_not_stored(&self.api_key, VOYAGE_API_KEY_VAR)?;
        read_secret(VOYAGE_API_KEY_VAR)
    }
}

impl VectorStoreConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        ensure_not_stored(&self.api_key, QDRANT_API_KEY_VAR)?;
        read_secret(QDRANT_API_KEY_VAR)
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        ensure_not_stored(&self.api_key, CEREBRAS_API_KEY_VAR)?;
        read_secret(CEREBRAS_API_KEY_VAR)
    }
}

fn ensure_not_stored(api_key: &Option<String>, var: &str) -> anyhow::Result<()> {
    if api_key.is_some() {
        return Err(anyhow!(
            "API keys must be provided via the {} environment variable, not stored in configuration",
            var
        ));
    }
    Ok(())
}

fn read_secret(var: &str) -> anyhow::Result<Option<String>> {
    let value = env::var(var).ok().filter(|v| !v.trim().is_empty());
    if let Some(value) = &value {
        check_not_placeholder(var, value)?;
    }
    Ok(value)
}

/// Reject secrets that still carry a template value
pub fn check_not_placeholder(name: &str, value: &str) -> anyhow::Result<()> {
    let lowered = value.to_lowercase();
    if PLACEHOLDER_MARKERS.iter().any(|p| lowered.contains(p)) {
        return Err(anyhow!("{} appears to be a placeholder value", name));
    }
    Ok(())
}

/// Show only the last four characters of a secret
pub fn redact(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "***".to_string();
    }
    let tail: String = key.chars().skip(len - 4).collect();
    format!("***{}", tail)
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("GNOSIS_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("gnosis")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration with environment overrides applied
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_stored()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load only what is stored in the config file
    ///
    /// Use this when the result may be saved back, so that environment
    /// overrides never end up in the file.
    pub fn load_stored() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("GNOSIS_QDRANT_URL") {
            if !url.trim().is_empty() {
                self.vector_store.url = url;
            }
        }
        if let Ok(level) = env::var("GNOSIS_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.log_level = level;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure_not_stored(&self.embedding.api_key, VOYAGE_API_KEY_VAR)?;
        ensure_not_stored(&self.vector_store.api_key, QDRANT_API_KEY_VAR)?;
        ensure_not_stored(&self.llm.api_key, CEREBRAS_API_KEY_VAR)?;

        if self.embedding.dimension == 0 {
            return Err(anyhow!("Embedding dimension must be positive"));
        }
        if self.vector_store.collection.trim().is_empty() {
            return Err(anyhow!("Vector store collection name must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "log_level" => Ok(self.log_level.clone()),

            "embedding.base_url" => Ok(self.embedding.base_url.clone()),
            "embedding.model" => Ok(self.embedding.model.clone()),
            "embedding.dimension" => Ok(self.embedding.dimension.to_string()),
            "embedding.timeout_secs" => Ok(self.embedding.timeout_secs.to_string()),
            "embedding.api_key" => {
                redacted_or_hint(self.embedding.resolved_api_key()?, VOYAGE_API_KEY_VAR)
            }

            "vector_store.url" => Ok(self.vector_store.url.clone()),
            "vector_store.collection" => Ok(self.vector_store.collection.clone()),
            "vector_store.timeout_secs" => Ok(self.vector_store.timeout_secs.to_string()),
            "vector_store.api_key" => {
                redacted_or_hint(self.vector_store.resolved_api_key()?, QDRANT_API_KEY_VAR)
            }

            "llm.base_url" => Ok(self.llm.base_url.clone()),
            "llm.model" => Ok(self.llm.model.clone()),
            "llm.temperature" => Ok(self.llm.temperature.to_string()),
            "llm.max_tokens" => Ok(self.llm.max_tokens.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),
            "llm.api_key" => redacted_or_hint(self.llm.resolved_api_key()?, CEREBRAS_API_KEY_VAR),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `gnosis config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "log_level" => {
                let valid = ["trace", "debug", "info", "warn", "error"];
                let level = value.to_lowercase();
                if !valid.contains(&level.as_str()) {
                    return Err(anyhow!(
                        "Invalid log level: {}. Valid options: {}",
                        value,
                        valid.join(", ")
                    ));
                }
                self.log_level = level;
            }

            "embedding.base_url" => self.embedding.base_url = value.to_string(),
            "embedding.model" => self.embedding.model = value.to_string(),
            "embedding.dimension" => {
                let dimension: usize = value
                    .parse()
                    .with_context(|| format!("Invalid dimension value: {}", value))?;
                if dimension == 0 {
                    return Err(anyhow!("Embedding dimension must be positive"));
                }
                self.embedding.dimension = dimension;
            }
            "embedding.timeout_secs" => {
                self.embedding.timeout_secs = parse_timeout(value)?;
            }

            "vector_store.url" => self.vector_store.url = value.to_string(),
            "vector_store.collection" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("Collection name must not be empty"));
                }
                self.vector_store.collection = value.to_string();
            }
            "vector_store.timeout_secs" => {
                self.vector_store.timeout_secs = parse_timeout(value)?;
            }

            "llm.base_url" => self.llm.base_url = value.to_string(),
            "llm.model" => self.llm.model = value.to_string(),
            "llm.temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.llm.temperature = temp;
            }
            "llm.max_tokens" => {
                self.llm.max_tokens = value
                    .parse()
                    .with_context(|| format!("Invalid max_tokens value: {}", value))?;
            }
            "llm.timeout_secs" => {
                self.llm.timeout_secs = parse_timeout(value)?;
            }

            "embedding.api_key" | "vector_store.api_key" | "llm.api_key" => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration. Set {}, {} or {} in the environment instead.",
                    VOYAGE_API_KEY_VAR,
                    QDRANT_API_KEY_VAR,
                    CEREBRAS_API_KEY_VAR
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `gnosis config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "log_level",
            "embedding.base_url",
            "embedding.model",
            "embedding.dimension",
            "embedding.timeout_secs",
            "embedding.api_key",
            "vector_store.url",
            "vector_store.collection",
            "vector_store.timeout_secs",
            "vector_store.api_key",
            "llm.base_url",
            "llm.model",
            "llm.temperature",
            "llm.max_tokens",
            "llm.timeout_secs",
            "llm.api_key",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn redacted_or_hint(key: Option<String>, var: &str) -> anyhow::Result<String> {
    Ok(match key {
        Some(key) => redact(&key),
        None => format!("(not set - use the {} env var)", var),
    })
}

fn parse_timeout(value: &str) -> anyhow::Result<u64> {
    let secs: u64 = value
        .parse()
        .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
    if secs == 0 {
        return Err(anyhow!("Timeout must be at least one second"));
    }
    Ok(secs)
}
