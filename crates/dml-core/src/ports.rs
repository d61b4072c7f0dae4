//! The three seams the orchestrator is built against.
//!
//! Each port has exactly one method surface so adapters (code-search backends,
//! model providers, storage media) can be swapped without touching
//! [`Orchestrator`](crate::Orchestrator).

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::models::{CodeSnippet, Finding, RejectedSnippet, RepoCatalog};

/// A finite, single-pass, pull-based stream of candidate snippets.
///
/// Implementations fetch lazily: the next snippet is produced only when
/// asked for, so memory stays bounded however large the result set is.
/// Once `next_snippet` returns `None` it keeps returning `None`.
#[async_trait]
pub trait SnippetSource: Send {
    async fn next_snippet(&mut self) -> Option<CodeSnippet>;
}

/// Turns one snippet into zero or more findings.
///
/// Never fails: transport errors, timeouts, bad statuses, and malformed
/// payloads all yield an empty list, indistinguishable from "no DML here".
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, snippet: &CodeSnippet) -> Vec<Finding>;
}

/// Persists the products of a run.
///
/// A failure must be reported as an error, never as a silently truncated
/// artifact.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save(&self, catalogs: &[RepoCatalog]) -> Result<(), SinkError>;

    async fn save_rejected(&self, snippets: &[RejectedSnippet]) -> Result<(), SinkError>;
}

#[async_trait]
impl<S: SnippetSource + ?Sized> SnippetSource for Box<S> {
    async fn next_snippet(&mut self) -> Option<CodeSnippet> {
        (**self).next_snippet().await
    }
}

#[async_trait]
impl<C: Classifier + ?Sized> Classifier for Box<C> {
    async fn classify(&self, snippet: &CodeSnippet) -> Vec<Finding> {
        (**self).classify(snippet).await
    }
}

#[async_trait]
impl<K: ResultSink + ?Sized> ResultSink for Box<K> {
    async fn save(&self, catalogs: &[RepoCatalog]) -> Result<(), SinkError> {
        (**self).save(catalogs).await
    }

    async fn save_rejected(&self, snippets: &[RejectedSnippet]) -> Result<(), SinkError> {
        (**self).save_rejected(snippets).await
    }
}
