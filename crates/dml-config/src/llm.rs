//! Classification backend configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

fn default_provider() -> String {
    String::from("ollama")
}

const fn default_timeout_ms() -> u64 {
    360_000
}

const fn default_pacing_ms() -> u64 {
    1_000
}

fn default_ollama_base_url() -> String {
    String::from("http://localhost:11434")
}

fn default_ollama_model() -> String {
    String::from("llama3")
}

fn default_gemini_api_url() -> String {
    String::from("https://generativelanguage.googleapis.com")
}

fn default_gemini_model() -> String {
    String::from("gemini-1.5-flash")
}

/// The named classification backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Ollama,
    Cloud,
    Gemini,
}

impl LlmProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Cloud => "cloud",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "cloud" | "openai" => Ok(Self::Cloud),
            "gemini" => Ok(Self::Gemini),
            other => Err(ConfigError::invalid(
                "llm.provider",
                format!("unknown provider '{other}' (expected ollama, cloud, or gemini)"),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CloudConfig {
    /// Full URL of the chat completions endpoint.
    #[serde(default)]
    pub api_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: default_gemini_api_url(),
            api_key: String::new(),
            model: default_gemini_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Backend name; see [`LlmProvider`].
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Upper bound for one classification call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Delay between successive classification calls.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub cloud: CloudConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_ms: default_timeout_ms(),
            pacing_ms: default_pacing_ms(),
            ollama: OllamaConfig::default(),
            cloud: CloudConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Parse the configured provider name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown provider.
    pub fn provider(&self) -> Result<LlmProvider, ConfigError> {
        self.provider.parse()
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("llm.timeout_ms", "must be greater than zero"));
        }
        match self.provider()? {
            LlmProvider::Ollama => {
                require("llm.ollama.base_url", &self.ollama.base_url)?;
                require("llm.ollama.model", &self.ollama.model)
            }
            LlmProvider::Cloud => {
                require("llm.cloud.api_url", &self.cloud.api_url)?;
                require("llm.cloud.api_key", &self.cloud.api_key)?;
                require("llm.cloud.model", &self.cloud.model)
            }
            LlmProvider::Gemini => {
                require("llm.gemini.api_url", &self.gemini.api_url)?;
                require("llm.gemini.api_key", &self.gemini.api_key)?;
                require("llm.gemini.model", &self.gemini.model)
            }
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::missing(field))
    } else {
        Ok(())
    }
}
