//! # dml-source
//!
//! Snippet sources for the DML catalog bot.
//!
//! - [`GitHubSearchSource`]: one code search per keyword across an
//!   organization or user, with per-keyword pacing and rate-limit backoff.
//! - [`LocalKeywordSource`]: whole-word keyword scan over a local checkout.
//!
//! Both implement [`dml_core::SnippetSource`] and are pull-based: nothing is
//! fetched or read until the consumer asks for the next snippet. Neither
//! surfaces runtime errors; failures are logged and the affected keyword or
//! file is skipped.

pub mod context;
pub mod error;
pub mod github;
mod http;
pub mod local;

pub use context::ContextPolicy;
pub use error::SourceError;
pub use github::{GitHubClient, GitHubSearchSource};
pub use local::LocalKeywordSource;
