use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::OllamaConfig;
use crate::llm::ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub sql: SqlConfig,
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: 300000,
        }
    }
}

impl LlmConfig {
    pub fn to_ollama_config(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Print the model's raw reply before mediation
    pub show_raw_responses: bool,
    /// Ask the backend for JSON output on the first pass
    pub json_mode: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            show_raw_responses: false,
            json_mode: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            model: "gemma3:latest".to_string(),
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Page text beyond this many characters is cut off
    pub max_text_length: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_text_length: 124000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            chat: ChatConfig::default(),
            sql: SqlConfig::default(),
            rag: RagConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        Ok(Self::load_first(&Self::default_locations()))
    }

    /// `~/.config/<project>/<project>.yml`, then `./<project>.yml`
    fn default_locations() -> Vec<PathBuf> {
        let project_name = env!("CARGO_PKG_NAME");
        let mut locations = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }
        locations.push(PathBuf::from(format!("{}.yml", project_name)));
        locations
    }

    /// First candidate that loads; broken files are logged and skipped
    fn load_first(candidates: &[PathBuf]) -> Self {
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    log::warn!("Failed to load config from {}: {:#}", path.display(), e);
                }
            }
        }

        // No usable config file found, use defaults
        log::info!("No config file found, using defaults");
        Self::default()
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded file
    pub fn with_overrides(mut self, model: Option<&str>, base_url: Option<&str>) -> Self {
        if let Some(model) = model {
            self.llm.model = model.to_string();
        }
        if let Some(base_url) = base_url {
            self.llm.base_url = base_url.to_string();
        }
        self
    }
}
