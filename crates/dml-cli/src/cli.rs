use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};

/// Snippet source selectable from the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceArg {
    Github,
    Local,
}

/// Top-level CLI parser for the `dmlcat` binary.
///
/// Every flag except `--config`, `--quiet` and `--verbose` overrides the
/// matching configuration value.
#[derive(Debug, Parser)]
#[command(
    name = "dmlcat",
    version,
    about = "Catalog the INSERT/UPDATE/DELETE/MERGE statements in an organization's code"
)]
pub struct Cli {
    /// Explicit TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Where snippets come from
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    /// Local checkout to scan (implies `--source local`)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Treat every subdirectory of the local path as its own repository
    #[arg(long)]
    pub checkouts: bool,

    /// GitHub organization to search
    #[arg(long, conflicts_with = "user")]
    pub org: Option<String>,

    /// GitHub user to search
    #[arg(long)]
    pub user: Option<String>,

    /// Restrict the search to one branch
    #[arg(long)]
    pub branch: Option<String>,

    /// Comma-separated keywords to search for
    #[arg(long, value_delimiter = ',')]
    pub keywords: Option<Vec<String>>,

    /// Classification backend: ollama, cloud, or gemini
    #[arg(long)]
    pub provider: Option<String>,

    /// Where to write the catalog
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write snippets the classifier found nothing in
    #[arg(long)]
    pub log_rejected: bool,
}

/// Process exit code for a failed parse: 0 when the user asked for help or
/// the version, 1 for anything else (bad flags are configuration errors).
#[must_use]
pub fn exit_code(error: &clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::{Cli, SourceArg, exit_code};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_is_valid() {
        let cli = Cli::try_parse_from(["dmlcat"]).expect("cli should parse");
        assert!(cli.config.is_none());
        assert!(!cli.log_rejected);
        assert!(cli.keywords.is_none());
    }

    #[test]
    fn overrides_parse() {
        let cli = Cli::try_parse_from([
            "dmlcat",
            "--org",
            "acme",
            "--branch",
            "main",
            "--keywords",
            "INSERT,MERGE",
            "--source",
            "github",
            "--log-rejected",
            "-v",
        ])
        .expect("cli should parse");

        assert_eq!(cli.org.as_deref(), Some("acme"));
        assert_eq!(cli.branch.as_deref(), Some("main"));
        assert_eq!(cli.keywords, Some(vec!["INSERT".to_string(), "MERGE".to_string()]));
        assert_eq!(cli.source, Some(SourceArg::Github));
        assert!(cli.log_rejected);
        assert!(cli.verbose);
    }

    #[test]
    fn org_and_user_conflict() {
        assert!(Cli::try_parse_from(["dmlcat", "--org", "acme", "--user", "octocat"]).is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["dmlcat", "-q", "-v"]).is_err());
    }

    #[test]
    fn help_and_version_exit_cleanly() {
        for flag in ["--help", "--version"] {
            let err = Cli::try_parse_from(["dmlcat", flag]).unwrap_err();
            assert_eq!(exit_code(&err), 0, "{flag}");
        }
    }

    #[test]
    fn flag_errors_exit_with_one() {
        let cases: [&[&str]; 3] = [
            &["dmlcat", "--org", "acme", "--user", "octocat"],
            &["dmlcat", "--source", "gitlab"],
            &["dmlcat", "--no-such-flag"],
        ];
        for args in cases {
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(exit_code(&err), 1, "{args:?}");
        }
    }
}
