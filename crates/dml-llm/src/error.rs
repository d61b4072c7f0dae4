//! Classifier error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while asking a model to classify a snippet.
///
/// Only construction errors leave this crate. Everything raised during a
/// classification call is logged and collapsed to an empty result.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport error. The request URL is stripped.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The model endpoint returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the endpoint.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The endpoint returned 429 Too Many Requests.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds the endpoint asked us to wait.
        retry_after_secs: u64,
    },

    /// The call did not complete within the configured timeout.
    #[error("classification timed out after {0:?}")]
    Timeout(Duration),

    /// The response envelope carried no model output.
    #[error("response contained no model output")]
    EmptyResponse,

    /// The model output was not a list of DML statement records.
    #[error("malformed model output: {0}")]
    Malformed(String),

    /// Invalid classifier configuration.
    #[error(transparent)]
    Config(#[from] dml_config::ConfigError),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}
