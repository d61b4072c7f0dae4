//! # dml-llm
//!
//! Language-model classifiers for the DML catalog bot.
//!
//! [`LlmClassifier`] implements [`dml_core::Classifier`] against one of three
//! backends:
//! - a local Ollama instance (`/api/generate`)
//! - any OpenAI-compatible chat completions endpoint
//! - Google Gemini (`generateContent`)
//!
//! All backends share one prompt and one response parser. A classification
//! call never fails: transport errors, bad statuses, timeouts and malformed
//! output are logged and reported as "no findings".

mod cloud;
mod error;
mod gemini;
mod http;
mod ollama;
pub mod parse;
pub mod prompt;

pub use error::LlmError;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use dml_config::{ConfigError, LlmConfig, LlmProvider};
use dml_core::{Classifier, CodeSnippet, Finding};

/// Used when no timeout is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(360_000);

#[derive(Debug, Clone)]
enum Backend {
    Ollama {
        base_url: String,
        model: String,
    },
    Cloud {
        api_url: String,
        api_key: String,
        model: String,
    },
    Gemini {
        api_url: String,
        api_key: String,
        model: String,
    },
}

/// Classifier backed by a remote or local language model.
pub struct LlmClassifier {
    http: reqwest::Client,
    backend: Backend,
    timeout: Duration,
}

impl LlmClassifier {
    fn with_backend(backend: Backend) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent("dmlcat/0.1")
                .build()
                .expect("reqwest client should build"),
            backend,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Classifier for a local Ollama instance.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` fails to build.
    #[must_use]
    pub fn ollama(base_url: &str, model: &str) -> Self {
        Self::with_backend(Backend::Ollama {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Classifier for an OpenAI-compatible chat completions endpoint.
    /// `api_url` is the full endpoint URL.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` fails to build.
    #[must_use]
    pub fn cloud(api_url: &str, api_key: &str, model: &str) -> Self {
        Self::with_backend(Backend::Cloud {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Classifier for Google Gemini.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` fails to build.
    #[must_use]
    pub fn gemini(api_url: &str, api_key: &str, model: &str) -> Self {
        Self::with_backend(Backend::Gemini {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Build the classifier selected by `llm.provider`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] for an unknown provider or when a field the
    /// provider needs is empty.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let classifier = match config.provider()? {
            LlmProvider::Ollama => {
                require("llm.ollama.base_url", &config.ollama.base_url)?;
                require("llm.ollama.model", &config.ollama.model)?;
                Self::ollama(&config.ollama.base_url, &config.ollama.model)
            }
            LlmProvider::Cloud => {
                require("llm.cloud.api_url", &config.cloud.api_url)?;
                require("llm.cloud.api_key", &config.cloud.api_key)?;
                require("llm.cloud.model", &config.cloud.model)?;
                Self::cloud(&config.cloud.api_url, &config.cloud.api_key, &config.cloud.model)
            }
            LlmProvider::Gemini => {
                require("llm.gemini.api_url", &config.gemini.api_url)?;
                require("llm.gemini.api_key", &config.gemini.api_key)?;
                require("llm.gemini.model", &config.gemini.model)?;
                Self::gemini(
                    &config.gemini.api_url,
                    &config.gemini.api_key,
                    &config.gemini.model,
                )
            }
        };
        Ok(classifier.with_timeout(config.timeout()))
    }

    /// Override the per-call timeout. A zero duration keeps the default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    #[must_use]
    pub const fn provider(&self) -> LlmProvider {
        match self.backend {
            Backend::Ollama { .. } => LlmProvider::Ollama,
            Backend::Cloud { .. } => LlmProvider::Cloud,
            Backend::Gemini { .. } => LlmProvider::Gemini,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Classify `snippet`, surfacing every failure.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Timeout`] when the call exceeds the timeout, and
    /// any other [`LlmError`] raised by the request or by parsing.
    pub async fn try_classify(&self, snippet: &CodeSnippet) -> Result<Vec<Finding>, LlmError> {
        let raw = tokio::time::timeout(self.timeout, self.complete(snippet))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;
        parse::parse_findings(&raw, snippet)
    }

    /// Raw model output for `snippet`.
    async fn complete(&self, snippet: &CodeSnippet) -> Result<String, LlmError> {
        match &self.backend {
            Backend::Ollama { base_url, model } => {
                self.generate_ollama(base_url, model, snippet).await
            }
            Backend::Cloud {
                api_url,
                api_key,
                model,
            } => self.complete_chat(api_url, api_key, model, snippet).await,
            Backend::Gemini {
                api_url,
                api_key,
                model,
            } => self.generate_gemini(api_url, api_key, model, snippet).await,
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing {
            field: field.to_string(),
        })
    } else {
        Ok(())
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, snippet: &CodeSnippet) -> Vec<Finding> {
        match self.try_classify(snippet).await {
            Ok(findings) => {
                debug!(
                    repo = %snippet.repo_name,
                    path = %snippet.file_path,
                    line = snippet.line,
                    findings = findings.len(),
                    "model answered"
                );
                findings
            }
            Err(err) => {
                warn!(
                    provider = %self.provider(),
                    repo = %snippet.repo_name,
                    path = %snippet.file_path,
                    line = snippet.line,
                    error = %err,
                    "classification failed; treating as no findings"
                );
                Vec::new()
            }
        }
    }
}
