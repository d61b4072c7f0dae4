use clap::Parser;
use tracing::info;

mod bootstrap;
mod cli;
mod pipeline;

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            std::process::exit(cli::exit_code(&error));
        }
    };

    if let Err(error) = run(&cli).await {
        eprintln!("dmlcat error: {error:#}");
        std::process::exit(1);
    }
}

async fn run(cli: &cli::Cli) -> anyhow::Result<()> {
    init_tracing(cli.quiet, cli.verbose)?;

    let config = bootstrap::load_config(cli)?;
    let summary = pipeline::run(&config).await?;

    info!(
        snippets = summary.snippets_processed,
        repositories = summary.repositories_seen,
        catalogs = summary.catalogs,
        findings = summary.findings,
        rejected = summary.rejected,
        "run complete"
    );
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("DMLCAT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
