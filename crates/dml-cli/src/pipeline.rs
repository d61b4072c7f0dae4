use anyhow::Context;
use tracing::info;

use dml_config::{DmlConfig, SourceKind};
use dml_core::{Orchestrator, RunOptions, RunSummary, SnippetSource};
use dml_llm::LlmClassifier;
use dml_source::{GitHubSearchSource, LocalKeywordSource};
use dml_store::JsonFileSink;

/// Wire the configured adapters together and run one catalog pass.
pub async fn run(config: &DmlConfig) -> anyhow::Result<RunSummary> {
    let source = build_source(config)?;
    let classifier =
        LlmClassifier::from_config(&config.llm).context("failed to set up the classifier")?;
    let sink = JsonFileSink::from_config(&config.output);

    info!(
        provider = %classifier.provider(),
        catalog = %sink.catalog_path().display(),
        "starting DML catalog run"
    );

    let orchestrator = Orchestrator::new(
        classifier,
        sink,
        RunOptions {
            pacing: config.llm.pacing(),
            log_rejected: config.output.log_rejected,
        },
    );
    let options = orchestrator.options();
    info!(
        pacing = ?options.pacing,
        log_rejected = options.log_rejected,
        "classification settings"
    );
    orchestrator
        .run(source)
        .await
        .context("failed to save results")
}

fn build_source(config: &DmlConfig) -> anyhow::Result<Box<dyn SnippetSource>> {
    match config.scan.source {
        SourceKind::Github => {
            let source = GitHubSearchSource::new(&config.github, &config.scan)
                .context("failed to set up GitHub code search")?;
            let scope = config.github.scope().context("invalid GitHub scope")?;
            info!(
                %scope,
                keywords = ?config.scan.keywords,
                "searching GitHub"
            );
            Ok(Box::new(source))
        }
        SourceKind::Local => {
            let source = LocalKeywordSource::new(&config.scan)
                .with_context(|| format!("failed to open {}", config.scan.local_path))?;
            info!(
                path = %config.scan.local_path,
                repositories = ?source.repositories().collect::<Vec<_>>(),
                keywords = ?config.scan.keywords,
                "scanning local checkout"
            );
            Ok(Box::new(source))
        }
    }
}
