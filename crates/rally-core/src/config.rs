use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RallyError, Result};

/// Environment variable holding the bearer credential for the model provider.
pub const API_KEY_ENV: &str = "HF_API_KEY";
/// Environment variable selecting the upstream model identifier.
pub const MODEL_ENV: &str = "HF_MODEL";

/// Top-level configuration for the Rally application.
///
/// Loaded from `~/.rally/config.toml` by default. Every section falls back to
/// its defaults when missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RallyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl RallyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RallyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not
    /// exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file. The API key is never written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RallyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Pull `HF_API_KEY` and `HF_MODEL` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(MODEL_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, api_key: Option<String>, model: Option<String>) {
        self.model.api_key = api_key.filter(|k| !k.trim().is_empty());
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model.model = model;
        }
    }

    /// Proxy endpoint the voice dispatcher posts to. Defaults to this
    /// process's own `/api/voice-agent` route.
    pub fn proxy_url(&self) -> String {
        if self.voice.proxy_url.trim().is_empty() {
            format!("http://127.0.0.1:{}/api/voice-agent", self.general.port)
        } else {
            self.voice.proxy_url.clone()
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            port: 3030,
        }
    }
}

/// Voice assistant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Locale for recognition and synthesis.
    pub locale: String,
    /// Word that unmutes the assistant.
    pub activation_keyword: String,
    /// Text-generation proxy endpoint. Empty means the local server.
    pub proxy_url: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            locale: "es-ES".to_string(),
            activation_keyword: "activar".to_string(),
            proxy_url: String::new(),
        }
    }
}

/// Hosted text-generation model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Inference API base URL; the model id is appended as a path segment.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Token limit sent with every generation request.
    pub max_new_tokens: u32,
    /// Bearer credential, only ever taken from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "google/flan-t5-base".to_string(),
            max_new_tokens: 50,
            api_key: None,
        }
    }
}

impl ModelConfig {
    /// Full generation endpoint for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.model.trim_start_matches('/')
        )
    }
}

/// Simulated match feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Whether the simulated event feed runs.
    pub enabled: bool,
    /// Interval between detection ticks in milliseconds.
    pub tick_ms: u64,
    /// Delay between a swing and the point being resolved, in milliseconds.
    pub resolve_delay_ms: u64,
    /// Chance that a tick starts a rally.
    pub point_probability: f64,
    /// Chance that a rally opens with a serve rather than a stroke.
    pub serve_probability: f64,
    /// Chance that a serve is a second serve.
    pub second_serve_probability: f64,
    /// Chance that a rally ends with a decided point.
    pub decided_probability: f64,
    /// Display names for the two players.
    pub players: [String; 2],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_ms: 4000,
            resolve_delay_ms: 1500,
            point_probability: 0.15,
            serve_probability: 0.4,
            second_serve_probability: 0.3,
            decided_probability: 0.3,
            players: ["Lucía".to_string(), "Alex".to_string()],
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
