//! Output artifact configuration.

use serde::{Deserialize, Serialize};

fn default_catalog_path() -> String {
    String::from("dml_catalog.json")
}

fn default_rejected_path() -> String {
    String::from("rejected_snippets.json")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Where the confirmed catalog array is written.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Where rejected snippets are written when `log_rejected` is on.
    #[serde(default = "default_rejected_path")]
    pub rejected_path: String,

    /// Keep snippets the classifier found no DML in.
    #[serde(default)]
    pub log_rejected: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            rejected_path: default_rejected_path(),
            log_rejected: false,
        }
    }
}
