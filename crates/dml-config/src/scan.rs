//! Snippet discovery settings shared by every source.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

fn default_keywords() -> Vec<String> {
    ["INSERT", "UPDATE", "DELETE", "MERGE"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_context_radius() -> usize {
    2
}

const fn default_keyword_delay_ms() -> u64 {
    2_000
}

const fn default_rate_limit_backoff_ms() -> u64 {
    10_000
}

fn default_local_extensions() -> Vec<String> {
    [
        ".php", ".go", ".java", ".cs", ".py", ".rb", ".js", ".ts", ".sql",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Where snippets come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Remote code search across an organization or user account.
    #[default]
    Github,
    /// A local checkout walked on disk.
    Local,
}

/// How much code is handed to the classifier for each match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// `context_radius` lines on each side of the matched line.
    #[default]
    Window,
    /// The entire file.
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub source: SourceKind,

    /// Ordered search terms. Accepts a list or a comma-separated string.
    #[serde(
        default = "default_keywords",
        deserialize_with = "deserialize_keywords"
    )]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub context: ContextMode,

    #[serde(default = "default_context_radius")]
    pub context_radius: usize,

    /// Delay between successive keyword queries.
    #[serde(default = "default_keyword_delay_ms")]
    pub keyword_delay_ms: u64,

    /// Delay after the search API signals a rate limit.
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    /// Root of the checkout for [`SourceKind::Local`].
    #[serde(default)]
    pub local_path: String,

    /// Treat every subdirectory of `local_path` as its own repository.
    #[serde(default)]
    pub local_checkouts: bool,

    /// File extensions the local scanner reads (with leading dot).
    #[serde(
        default = "default_local_extensions",
        deserialize_with = "deserialize_keywords"
    )]
    pub local_extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            keywords: default_keywords(),
            context: ContextMode::default(),
            context_radius: default_context_radius(),
            keyword_delay_ms: default_keyword_delay_ms(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            local_path: String::new(),
            local_checkouts: false,
            local_extensions: default_local_extensions(),
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub const fn keyword_delay(&self) -> Duration {
        Duration::from_millis(self.keyword_delay_ms)
    }

    #[must_use]
    pub const fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::missing("scan.keywords"));
        }
        if self.source == SourceKind::Local && self.local_path.trim().is_empty() {
            return Err(ConfigError::missing("scan.local_path"));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    List(Vec<String>),
    Csv(String),
}

/// Accept `["A", "B"]` or `"A,B"`; trims entries and drops blanks.
fn deserialize_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match StringList::deserialize(deserializer)? {
        StringList::List(items) => items,
        StringList::Csv(joined) => joined.split(',').map(String::from).collect(),
    };
    Ok(raw
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}
