use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm::{gemini, perplexity, DEFAULT_TIMEOUT};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub research: ResearchConfig,
    pub synthesis: SynthesisConfig,
    pub relay: RelayConfig,
}

/// First-stage (search-grounded) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// API key; falls back to `PERPLEXITY_API_KEY` when unset.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Second-stage (synthesis) provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// API key; falls back to `GEMINI_API_KEY` when unset.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Relay service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub port: u16,
}

const DEFAULT_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT.as_secs();

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            research: ResearchConfig::default(),
            synthesis: SynthesisConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: perplexity::DEFAULT_MODEL.to_string(),
            base_url: perplexity::DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: gemini::DEFAULT_MODEL.to_string(),
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { port: 8787 }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/savvy/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!(
                    "No config file at {} — using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Research API key: file value, then environment.
    pub fn research_api_key(&self) -> Option<String> {
        self.research
            .api_key
            .clone()
            .or_else(|| std::env::var("PERPLEXITY_API_KEY").ok())
    }

    /// Synthesis API key: file value, then environment.
    pub fn synthesis_api_key(&self) -> Option<String> {
        self.synthesis
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    }

    pub fn research_timeout(&self) -> Duration {
        Duration::from_secs(self.research.timeout_secs)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis.timeout_secs)
    }

    fn config_path() -> std::path::PathBuf {
        dirs::config_dir()
            .map(|d| d.join("savvy").join("config.toml"))
            .unwrap_or_else(|| std::path::PathBuf::from("config.toml"))
    }
}
