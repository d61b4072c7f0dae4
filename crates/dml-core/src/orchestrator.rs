//! Drives one catalog run: drain the source, classify, aggregate, flush.
//!
//! ```text
//! start → draining ─(source exhausted)→ aggregate → flush → done
//!            ↑   │
//!            └───┘ pull snippet, pace, classify, bucket
//! ```
//!
//! Exactly one classification is in flight at a time and the source is only
//! asked for its next snippet after the current one has been bucketed. Only
//! sink failures are returned to the caller; everything upstream has already
//! degraded to "fewer snippets" or "no findings" by the time it gets here.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::errors::SinkError;
use crate::models::{CodeSnippet, Finding, RejectedSnippet, RepoCatalog};
use crate::ports::{Classifier, ResultSink, SnippetSource};

/// Default delay between successive classification calls.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1000);

/// Per-run behaviour of the [`Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Suspension before every classification call except the first.
    /// `Duration::ZERO` disables pacing.
    pub pacing: Duration,
    /// Keep snippets with no findings and hand them to
    /// [`ResultSink::save_rejected`].
    pub log_rejected: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            log_rejected: false,
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub snippets_processed: usize,
    pub repositories_seen: usize,
    pub catalogs: usize,
    pub findings: usize,
    pub rejected: usize,
}

/// Findings bucketed by repository, in first-seen repository order.
#[derive(Default)]
struct Accumulator {
    buckets: Vec<(String, Vec<Finding>)>,
    index: HashMap<String, usize>,
    rejected: Vec<RejectedSnippet>,
    repos_seen: HashSet<String>,
    processed: usize,
}

impl Accumulator {
    fn record(&mut self, snippet: CodeSnippet, findings: Vec<Finding>, keep_rejected: bool) {
        self.processed += 1;
        self.repos_seen.insert(snippet.repo_name.clone());

        if findings.is_empty() {
            if keep_rejected {
                self.rejected.push(snippet);
            }
            return;
        }

        match self.index.get(&snippet.repo_name) {
            Some(&slot) => self.buckets[slot].1.extend(findings),
            None => {
                self.index.insert(snippet.repo_name.clone(), self.buckets.len());
                self.buckets.push((snippet.repo_name, findings));
            }
        }
    }
}

/// Runs the catalog pipeline against a classifier and a sink.
///
/// The source is supplied per run; the orchestrator keeps no state between
/// runs.
pub struct Orchestrator<C, K> {
    classifier: C,
    sink: K,
    options: RunOptions,
}

impl<C: Classifier, K: ResultSink> Orchestrator<C, K> {
    pub const fn new(classifier: C, sink: K, options: RunOptions) -> Self {
        Self {
            classifier,
            sink,
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> RunOptions {
        self.options
    }

    /// Execute one run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if persisting the catalogs or the rejected
    /// snippets fails. This happens only after the source is exhausted.
    pub async fn run<S: SnippetSource>(&self, mut source: S) -> Result<RunSummary, SinkError> {
        info!("searching for DML candidates");
        let gathered = self.drain(&mut source).await;

        let catalogs = aggregate(gathered.buckets);
        let summary = RunSummary {
            snippets_processed: gathered.processed,
            repositories_seen: gathered.repos_seen.len(),
            catalogs: catalogs.len(),
            findings: catalogs.iter().map(|c| c.dml_impacts.len()).sum(),
            rejected: gathered.rejected.len(),
        };

        self.flush(&catalogs, &gathered.rejected).await?;
        Ok(summary)
    }

    async fn drain<S: SnippetSource>(&self, source: &mut S) -> Accumulator {
        let mut acc = Accumulator::default();

        while let Some(snippet) = source.next_snippet().await {
            if acc.processed > 0 && !self.options.pacing.is_zero() {
                tokio::time::sleep(self.options.pacing).await;
            }

            debug!(
                repo = %snippet.repo_name,
                path = %snippet.file_path,
                line = snippet.line,
                "classifying snippet"
            );
            let findings = self.classifier.classify(&snippet).await;
            debug!(
                repo = %snippet.repo_name,
                path = %snippet.file_path,
                findings = findings.len(),
                "snippet classified"
            );

            acc.record(snippet, findings, self.options.log_rejected);
        }

        acc
    }

    async fn flush(
        &self,
        catalogs: &[RepoCatalog],
        rejected: &[RejectedSnippet],
    ) -> Result<(), SinkError> {
        if catalogs.is_empty() {
            info!("no DML statements found in any repository");
        } else {
            self.sink.save(catalogs).await?;
        }

        if self.options.log_rejected && !rejected.is_empty() {
            self.sink.save_rejected(rejected).await?;
        }

        Ok(())
    }
}

/// One catalog per non-empty bucket, each stamped when it is built.
fn aggregate(buckets: Vec<(String, Vec<Finding>)>) -> Vec<RepoCatalog> {
    buckets
        .into_iter()
        .filter(|(_, findings)| !findings.is_empty())
        .map(|(repo_name, dml_impacts)| {
            info!(repo = %repo_name, impacts = dml_impacts.len(), "repository aggregated");
            RepoCatalog {
                repo_name,
                analyzed_at: Utc::now(),
                dml_impacts,
            }
        })
        .collect()
}
