//! Snippet source error types.

use thiserror::Error;

/// Errors raised while discovering snippets.
///
/// None of these reach the orchestrator: search failures end the current
/// keyword, fetch failures skip the file. Only [`SourceError::Config`] and
/// [`SourceError::Pattern`] surface, at construction time.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The API signalled that the caller is being throttled.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds the API asked us to wait.
        retry_after_secs: u64,
    },

    /// File content could not be decoded to UTF-8 text.
    #[error("decode error: {0}")]
    Decode(String),

    /// Invalid source configuration.
    #[error(transparent)]
    Config(#[from] dml_config::ConfigError),

    /// A keyword could not be compiled into a matcher.
    #[error("invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
