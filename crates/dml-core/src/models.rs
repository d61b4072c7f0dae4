//! Snippets, findings, and per-repository catalogs.
//!
//! All types serialize with `camelCase` keys, which is the shape of the JSON
//! artifacts written by the result sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table name reported when the target of a statement cannot be resolved
/// statically (string formatting, variables, builders).
pub const AMBIGUOUS_TABLE: &str = "ambiguous";

// ---------------------------------------------------------------------------
// CodeSnippet
// ---------------------------------------------------------------------------

/// A candidate location suspected of containing DML.
///
/// `line` is best-effort metadata: remote code search does not report line
/// numbers, so sources locate the match heuristically and fall back to `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub repo_name: String,
    pub file_path: String,
    pub line: u32,
    /// Either a window of lines around the match or the whole file,
    /// depending on the source's context policy.
    pub code: String,
}

/// A snippet the classifier found no DML in. Same shape as [`CodeSnippet`].
pub type RejectedSnippet = CodeSnippet;

// ---------------------------------------------------------------------------
// DmlOperation
// ---------------------------------------------------------------------------

/// The four data-modifying statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DmlOperation {
    Insert,
    Update,
    Delete,
    Merge,
}

impl DmlOperation {
    pub const ALL: [Self; 4] = [Self::Insert, Self::Update, Self::Delete, Self::Merge];

    /// Keyword as it appears in SQL and in the JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Merge => "MERGE",
        }
    }
}

impl fmt::Display for DmlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the four DML keywords.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a DML operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for DmlOperation {
    type Err = UnknownOperation;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownOperation(trimmed.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// A classifier-confirmed DML statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub operation: DmlOperation,
    /// Target table, or [`AMBIGUOUS_TABLE`].
    pub table: String,
    pub description: String,
    pub source_file: String,
    pub source_line: u32,
}

impl Finding {
    /// Attach the location of `snippet` to a classified statement.
    ///
    /// An empty or whitespace-only table name becomes [`AMBIGUOUS_TABLE`].
    #[must_use]
    pub fn for_snippet(
        snippet: &CodeSnippet,
        operation: DmlOperation,
        table: &str,
        description: impl Into<String>,
    ) -> Self {
        let table = table.trim();
        Self {
            operation,
            table: if table.is_empty() {
                AMBIGUOUS_TABLE.to_string()
            } else {
                table.to_string()
            },
            description: description.into(),
            source_file: snippet.file_path.clone(),
            source_line: snippet.line,
        }
    }

    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.table == AMBIGUOUS_TABLE
    }
}

// ---------------------------------------------------------------------------
// RepoCatalog
// ---------------------------------------------------------------------------

/// All confirmed findings for one repository.
///
/// Only built for repositories with at least one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoCatalog {
    pub repo_name: String,
    pub analyzed_at: DateTime<Utc>,
    pub dml_impacts: Vec<Finding>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn snippet() -> CodeSnippet {
        CodeSnippet {
            repo_name: "svc-a".into(),
            file_path: "db.py".into(),
            line: 42,
            code: "UPDATE users SET active=0".into(),
        }
    }

    #[rstest]
    #[case("INSERT", DmlOperation::Insert)]
    #[case("update", DmlOperation::Update)]
    #[case(" Delete ", DmlOperation::Delete)]
    #[case("merge", DmlOperation::Merge)]
    fn operation_parses_case_insensitively(#[case] raw: &str, #[case] expected: DmlOperation) {
        assert_eq!(raw.parse::<DmlOperation>(), Ok(expected));
    }

    #[rstest]
    #[case("SELECT")]
    #[case("")]
    #[case("UPSERT")]
    fn operation_rejects_non_dml(#[case] raw: &str) {
        assert!(raw.parse::<DmlOperation>().is_err());
    }

    #[test]
    fn operation_serializes_uppercase() {
        let json = serde_json::to_string(&DmlOperation::Merge).unwrap();
        assert_eq!(json, "\"MERGE\"");
    }

    #[test]
    fn finding_takes_location_from_snippet() {
        let finding =
            Finding::for_snippet(&snippet(), DmlOperation::Update, "users", "Deactivates a user");
        assert_eq!(finding.source_file, "db.py");
        assert_eq!(finding.source_line, 42);
        assert_eq!(finding.table, "users");
        assert!(!finding.is_ambiguous());
    }

    #[test]
    fn blank_table_becomes_ambiguous() {
        let finding = Finding::for_snippet(&snippet(), DmlOperation::Insert, "  ", "Inserts");
        assert_eq!(finding.table, AMBIGUOUS_TABLE);
        assert!(finding.is_ambiguous());
    }

    #[test]
    fn catalog_uses_camel_case_keys() {
        let catalog = RepoCatalog {
            repo_name: "svc-a".into(),
            analyzed_at: Utc::now(),
            dml_impacts: vec![Finding::for_snippet(
                &snippet(),
                DmlOperation::Update,
                "users",
                "Deactivates a user",
            )],
        };
        let value = serde_json::to_value(&catalog).unwrap();
        assert_eq!(value["repoName"], "svc-a");
        assert!(value["analyzedAt"].is_string());
        assert_eq!(
            value["dmlImpacts"][0],
            serde_json::json!({
                "operation": "UPDATE",
                "table": "users",
                "description": "Deactivates a user",
                "sourceFile": "db.py",
                "sourceLine": 42
            })
        );
    }
}
