//! Turning a matched file into the code context handed to the classifier.

use dml_config::{ContextMode, ScanConfig};
use regex::{Regex, RegexBuilder};

/// How much of a file a snippet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPolicy {
    /// `radius` lines either side of the matched line.
    Window { radius: usize },
    /// The full file content.
    WholeFile,
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::Window { radius: 2 }
    }
}

impl ContextPolicy {
    #[must_use]
    pub const fn from_config(scan: &ScanConfig) -> Self {
        match scan.context {
            ContextMode::Window => Self::Window {
                radius: scan.context_radius,
            },
            ContextMode::File => Self::WholeFile,
        }
    }

    /// Code context for a match on the zero-based line `index` of `content`.
    #[must_use]
    pub fn extract(self, content: &str, index: usize) -> String {
        match self {
            Self::WholeFile => content.to_string(),
            Self::Window { radius } => {
                let lines: Vec<&str> = content.lines().collect();
                if lines.is_empty() {
                    return String::new();
                }
                let index = index.min(lines.len() - 1);
                let start = index.saturating_sub(radius);
                let end = index.saturating_add(radius).saturating_add(1).min(lines.len());
                lines[start..end].join("\n")
            }
        }
    }
}

/// Whole-word, case-insensitive matcher for one keyword.
///
/// # Errors
///
/// Returns [`regex::Error`] if the pattern exceeds the regex size limits.
pub fn keyword_matcher(keyword: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(keyword.trim())))
        .case_insensitive(true)
        .build()
}

/// Best-effort location of the matched line.
///
/// Tries each fragment line that contains the keyword and looks it up in the
/// file; falls back to the first file line containing the keyword. Returns a
/// zero-based index.
#[must_use]
pub fn locate_match<'a>(
    lines: &[&str],
    fragments: impl IntoIterator<Item = &'a str>,
    matcher: &Regex,
) -> Option<usize> {
    for fragment in fragments {
        for needle in fragment
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && matcher.is_match(l))
        {
            if let Some(index) = lines.iter().position(|line| line.contains(needle)) {
                return Some(index);
            }
        }
    }
    lines.iter().position(|line| matcher.is_match(line))
}

/// Convert a zero-based index to the one-based line number carried by a
/// snippet.
#[must_use]
pub fn line_number(index: usize) -> u32 {
    u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX)
}
