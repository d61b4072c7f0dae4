//! Cross-cutting error types.
//!
//! Only persistence failures leave the orchestrator. Source and classifier
//! failures are absorbed by their adapters; their error types live in the
//! respective crates (`SourceError`, `LlmError`).

use thiserror::Error;

/// Errors raised by a [`ResultSink`](crate::ResultSink).
#[derive(Debug, Error)]
pub enum SinkError {
    /// Filesystem or other I/O failure while writing an artifact.
    #[error("I/O error writing {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("sink error: {0}")]
    Other(String),
}
