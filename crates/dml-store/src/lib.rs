//! # dml-store
//!
//! [`JsonFileSink`] writes the catalog and the rejected-snippet log as
//! pretty-printed JSON arrays. Each write goes to a temporary file next to the
//! target and is renamed into place, so a failed run never leaves a truncated
//! artifact behind.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use dml_config::OutputConfig;
use dml_core::{RejectedSnippet, RepoCatalog, ResultSink, SinkError};

/// Result sink backed by two JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    catalog_path: PathBuf,
    rejected_path: PathBuf,
}

impl JsonFileSink {
    #[must_use]
    pub fn new(catalog_path: impl Into<PathBuf>, rejected_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            rejected_path: rejected_path.into(),
        }
    }

    #[must_use]
    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(&output.catalog_path, &output.rejected_path)
    }

    #[must_use]
    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    #[must_use]
    pub fn rejected_path(&self) -> &Path {
        &self.rejected_path
    }
}

/// Serialize `value` and atomically replace `path` with it.
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SinkError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || replace_file(&target, &bytes))
        .await
        .map_err(|e| SinkError::Other(format!("write task failed: {e}")))?
}

fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
    let io_error = |source: std::io::Error| SinkError::Io {
        target: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_error)?;

    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn save(&self, catalogs: &[RepoCatalog]) -> Result<(), SinkError> {
        write_json(&self.catalog_path, catalogs).await?;
        info!(
            path = %self.catalog_path.display(),
            repositories = catalogs.len(),
            "catalog saved"
        );
        Ok(())
    }

    async fn save_rejected(&self, snippets: &[RejectedSnippet]) -> Result<(), SinkError> {
        write_json(&self.rejected_path, snippets).await?;
        info!(
            path = %self.rejected_path.display(),
            snippets = snippets.len(),
            "rejected snippets saved"
        );
        Ok(())
    }
}
