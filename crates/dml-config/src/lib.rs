//! # dml-config
//!
//! Layered configuration loading for the DML catalog bot using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`DMLCAT_*` prefix, `__` as separator)
//! 2. `GITHUB_TOKEN` (mapped to `github.token`)
//! 3. An explicit TOML file passed on the command line
//! 4. Project-level `.dmlcat/config.toml`
//! 5. User-level `~/.config/dmlcat/config.toml`
//! 6. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `DMLCAT_GITHUB__ORG` -> `github.org`,
//! `DMLCAT_LLM__OLLAMA__MODEL` -> `llm.ollama.model`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use dml_config::DmlConfig;
//!
//! let config = DmlConfig::load_with_dotenv(None).expect("config");
//! config.validate().expect("valid config");
//! println!("searching {}", config.github.scope().expect("scope"));
//! ```

mod error;
mod github;
mod llm;
mod output;
mod scan;

pub use error::ConfigError;
pub use github::{GithubConfig, Scope};
pub use llm::{CloudConfig, GeminiConfig, LlmConfig, LlmProvider, OllamaConfig};
pub use output::OutputConfig;
pub use scan::{ContextMode, ScanConfig, SourceKind};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DmlConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl DmlConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need
    /// `.env` file loading. Does not validate; call [`Self::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed or a value
    /// has the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(explicit).extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support from the current directory.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".dmlcat/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Explicit file from the command line
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file_exact(path));
        }

        // Layer 4: Conventional token variable
        figment = figment.merge(
            Env::raw()
                .only(&["GITHUB_TOKEN"])
                .map(|_| "github.token".into()),
        );

        // Layer 5: Environment variables (highest priority)
        figment.merge(Env::prefixed("DMLCAT_").split("__"))
    }

    /// Check every value a run depends on.
    ///
    /// GitHub settings are only required when the GitHub source is selected.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scan.validate()?;
        if self.scan.source == SourceKind::Github {
            self.github.validate()?;
        }
        self.llm.validate()
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dmlcat").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = DmlConfig::default();
        assert!(config.github.validate().is_err());
        assert_eq!(config.scan.source, SourceKind::Github);
        assert!(!config.output.log_rejected);
    }

    #[test]
    fn default_config_fails_validation_without_github() {
        let err = DmlConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("github.token"));
    }

    #[test]
    fn local_source_skips_github_validation() {
        let config = DmlConfig {
            scan: ScanConfig {
                source: SourceKind::Local,
                local_path: ".".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
