use anyhow::Context;

use dml_config::{DmlConfig, SourceKind};

use crate::cli::{Cli, SourceArg};

/// Load layered configuration, apply command-line overrides, and validate.
pub fn load_config(cli: &Cli) -> anyhow::Result<DmlConfig> {
    let mut config = DmlConfig::load_with_dotenv(cli.config.as_deref())
        .context("failed to load configuration")?;
    apply_overrides(&mut config, cli);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn apply_overrides(config: &mut DmlConfig, cli: &Cli) {
    if let Some(source) = cli.source {
        config.scan.source = match source {
            SourceArg::Github => SourceKind::Github,
            SourceArg::Local => SourceKind::Local,
        };
    }
    if let Some(path) = &cli.path {
        config.scan.source = SourceKind::Local;
        config.scan.local_path = path.display().to_string();
    }
    if cli.checkouts {
        config.scan.local_checkouts = true;
    }
    // org and user are mutually exclusive; the flag replaces whichever scope
    // the files configured.
    if let Some(org) = &cli.org {
        config.github.org.clone_from(org);
        config.github.user.clear();
    }
    if let Some(user) = &cli.user {
        config.github.user.clone_from(user);
        config.github.org.clear();
    }
    if let Some(branch) = &cli.branch {
        config.github.branch.clone_from(branch);
    }
    if let Some(keywords) = &cli.keywords {
        config.scan.keywords = keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }
    if let Some(provider) = &cli.provider {
        config.llm.provider.clone_from(provider);
    }
    if let Some(output) = &cli.output {
        config.output.catalog_path = output.display().to_string();
    }
    if cli.log_rejected {
        config.output.log_rejected = true;
    }
}
