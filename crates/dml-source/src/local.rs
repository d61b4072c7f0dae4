//! Keyword scanner over local checkouts.
//!
//! Walks each tree with the `ignore` crate (gitignore-aware, `.git` and
//! `node_modules` always skipped), keeps files whose extension is in the
//! configured list, and emits one snippet per line that contains a keyword as
//! a whole word. Line numbers are exact.
//!
//! `scan.local_path` is either one checkout or, with `scan.local_checkouts`,
//! a directory holding one checkout per subdirectory. Each checkout is
//! reported under its directory name.
//!
//! With [`ContextPolicy::WholeFile`] a file yields a single snippet anchored at
//! its first matching line, so the same content is not classified repeatedly.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ignore::WalkBuilder;
use regex::{Regex, RegexBuilder};
use tracing::{debug, error, info, warn};

use dml_config::ScanConfig;
use dml_core::{CodeSnippet, SnippetSource};

use crate::context::{ContextPolicy, line_number};
use crate::error::SourceError;

/// Directories never descended into, regardless of ignore files.
const SKIPPED_DIRS: [&str; 2] = [".git", "node_modules"];

/// One repository on disk.
struct Checkout {
    root: PathBuf,
    repo_name: String,
}

/// Matches in one file not yet handed out.
struct OpenFile {
    repo_name: String,
    relative: String,
    content: String,
    matches: VecDeque<usize>,
}

/// Lazy snippet stream over one or more checkouts on disk.
pub struct LocalKeywordSource {
    checkouts: Vec<Checkout>,
    current: usize,
    matcher: Regex,
    extensions: Vec<String>,
    policy: ContextPolicy,
    files: Option<VecDeque<PathBuf>>,
    open: Option<OpenFile>,
}

impl LocalKeywordSource {
    /// Build a scanner for `scan.local_path`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the root does not exist or cannot be
    /// listed, [`SourceError::Config`] if no keywords are configured, and
    /// [`SourceError::Pattern`] if the keyword matcher cannot be compiled.
    pub fn new(scan: &ScanConfig) -> Result<Self, SourceError> {
        let keywords: Vec<String> = scan
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        if keywords.is_empty() {
            return Err(dml_config::ConfigError::Missing {
                field: "scan.keywords".into(),
            }
            .into());
        }
        let matcher = RegexBuilder::new(&format!(r"\b(?:{})\b", keywords.join("|")))
            .case_insensitive(true)
            .build()?;

        let root = std::fs::canonicalize(scan.local_path.trim())?;
        let checkouts = if scan.local_checkouts {
            checkouts_under(&root)?
        } else {
            vec![Checkout {
                repo_name: dir_name(&root),
                root,
            }]
        };

        Ok(Self {
            checkouts,
            current: 0,
            matcher,
            extensions: scan
                .local_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            policy: ContextPolicy::from_config(scan),
            files: None,
            open: None,
        })
    }

    /// Names of the repositories this source scans, in scan order.
    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.checkouts.iter().map(|c| c.repo_name.as_str())
    }

    async fn candidate_files(&self, root: &Path) -> VecDeque<PathBuf> {
        let walk_root = root.to_path_buf();
        let extensions = self.extensions.clone();
        match tokio::task::spawn_blocking(move || walk(&walk_root, &extensions)).await {
            Ok(files) => files,
            Err(err) => {
                error!(root = %root.display(), error = %err, "directory walk failed");
                VecDeque::new()
            }
        }
    }

    async fn open_file(&self, checkout: &Checkout, path: &Path) -> Option<OpenFile> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read file; skipping");
                return None;
            }
        };

        let mut matches: VecDeque<usize> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| self.matcher.is_match(line))
            .map(|(index, _)| index)
            .collect();
        if self.policy == ContextPolicy::WholeFile {
            matches.truncate(1);
        }
        if matches.is_empty() {
            return None;
        }

        let relative = path
            .strip_prefix(&checkout.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        debug!(
            repo = %checkout.repo_name,
            path = %relative,
            matches = matches.len(),
            "keyword matches found"
        );

        Some(OpenFile {
            repo_name: checkout.repo_name.clone(),
            relative,
            content,
            matches,
        })
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| "local".to_string(), |n| n.to_string_lossy().into_owned())
}

/// Immediate subdirectories of `root`, sorted, hidden and skipped ones left out.
fn checkouts_under(root: &Path) -> Result<Vec<Checkout>, SourceError> {
    let mut checkouts = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_str()) {
            continue;
        }
        checkouts.push(Checkout {
            root: entry.path(),
            repo_name: name,
        });
    }
    checkouts.sort_by(|a, b| a.repo_name.cmp(&b.repo_name));
    info!(root = %root.display(), checkouts = checkouts.len(), "found local checkouts");
    Ok(checkouts)
}

/// Every file under `root` with an accepted extension, in path order.
fn walk(root: &Path, extensions: &[String]) -> VecDeque<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(false);
    builder.sort_by_file_name(|a, b| a.cmp(b));
    builder.filter_entry(|entry| {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        !(is_dir && SKIPPED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref()))
    });

    builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| {
            path.extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .is_some_and(|e| extensions.contains(&e))
        })
        .collect()
}

#[async_trait]
impl SnippetSource for LocalKeywordSource {
    async fn next_snippet(&mut self) -> Option<CodeSnippet> {
        loop {
            if let Some(open) = self.open.as_mut() {
                if let Some(index) = open.matches.pop_front() {
                    return Some(CodeSnippet {
                        repo_name: open.repo_name.clone(),
                        file_path: open.relative.clone(),
                        line: line_number(index),
                        code: self.policy.extract(&open.content, index),
                    });
                }
                self.open = None;
            }

            let checkout = self.checkouts.get(self.current)?;
            if self.files.is_none() {
                let files = self.candidate_files(&checkout.root).await;
                self.files = Some(files);
            }
            match self.files.as_mut().and_then(VecDeque::pop_front) {
                Some(path) => self.open = self.open_file(checkout, &path).await,
                None => {
                    self.files = None;
                    self.current += 1;
                }
            }
        }
    }
}
