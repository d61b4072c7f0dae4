//! Defensive parsing of model output into findings.
//!
//! Accepted shapes:
//! - `{"dml_statements": [ ... ]}` (what the prompt asks for)
//! - a bare top-level array of records
//!
//! Either may be wrapped in a Markdown code fence. Every record must carry
//! string `operation`, `table` and `description` keys, otherwise the whole
//! payload is rejected. Records whose operation is not one of the four DML
//! kinds are dropped.

use serde::Deserialize;
use tracing::debug;

use dml_core::{CodeSnippet, DmlOperation, Finding};

use crate::error::LlmError;

#[derive(Debug, Deserialize)]
struct Statement {
    operation: String,
    table: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Envelope { dml_statements: Vec<Statement> },
    Bare(Vec<Statement>),
}

/// Turn raw model output into findings located at `snippet`.
///
/// # Errors
///
/// Returns [`LlmError::EmptyResponse`] for blank output and
/// [`LlmError::Malformed`] when the output is not one of the accepted shapes.
pub fn parse_findings(raw: &str, snippet: &CodeSnippet) -> Result<Vec<Finding>, LlmError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let statements = match serde_json::from_str::<Payload>(body) {
        Ok(Payload::Envelope { dml_statements }) => dml_statements,
        Ok(Payload::Bare(statements)) => statements,
        Err(err) => return Err(LlmError::Malformed(err.to_string())),
    };

    Ok(statements
        .into_iter()
        .filter_map(|statement| match statement.operation.parse::<DmlOperation>() {
            Ok(operation) => Some(Finding::for_snippet(
                snippet,
                operation,
                &statement.table,
                statement.description.trim(),
            )),
            Err(err) => {
                debug!(path = %snippet.file_path, %err, "dropping non-DML record");
                None
            }
        })
        .collect())
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an info string such as `json`.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dml_core::AMBIGUOUS_TABLE;
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

    #[test]
    fn envelope_payload() {
        let raw = r#"{"dml_statements": [{"operation": "UPDATE", "table": "users", "description": "Deactivates a user"}]}"#;
        let findings = parse_findings(raw, &snippet()).unwrap();
        assert_eq!(
            findings,
            vec![Finding {
                operation: DmlOperation::Update,
                table: "users".into(),
                description: "Deactivates a user".into(),
                source_file: "db.py".into(),
                source_line: 42,
            }]
        );
    }

    #[test]
    fn bare_array_payload() {
        let raw = r#"[{"operation": "insert", "table": "audit_log", "description": "Writes an audit row"}]"#;
        let findings = parse_findings(raw, &snippet()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].operation, DmlOperation::Insert);
        assert_eq!(findings[0].table, "audit_log");
    }

    #[test]
    fn fenced_payload() {
        let raw = "```json\n{\"dml_statements\": [{\"operation\": \"Merge\", \"table\": \"stock\", \"description\": \"Upserts stock\"}]}\n```";
        let findings = parse_findings(raw, &snippet()).unwrap();
        assert_eq!(findings[0].operation, DmlOperation::Merge);
    }

    #[test]
    fn empty_statement_list_is_not_an_error() {
        assert!(parse_findings(r#"{"dml_statements": []}"#, &snippet()).unwrap().is_empty());
        assert!(parse_findings("[]", &snippet()).unwrap().is_empty());
    }

    #[test]
    fn non_dml_records_are_dropped() {
        let raw = r#"{"dml_statements": [
            {"operation": "SELECT", "table": "users", "description": "Reads users"},
            {"operation": "DELETE", "table": "sessions", "description": "Clears sessions"}
        ]}"#;
        let findings = parse_findings(raw, &snippet()).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].operation, DmlOperation::Delete);
    }

    #[test]
    fn blank_table_becomes_ambiguous() {
        let raw = r#"[{"operation": "UPDATE", "table": "  ", "description": "Dynamic table"}]"#;
        let findings = parse_findings(raw, &snippet()).unwrap();
        assert_eq!(findings[0].table, AMBIGUOUS_TABLE);
        assert!(findings[0].is_ambiguous());
    }

    #[rstest]
    #[case::prose("I found one UPDATE statement.")]
    #[case::wrong_key(r#"{"statements": []}"#)]
    #[case::not_an_array(r#"{"dml_statements": "none"}"#)]
    #[case::missing_field(r#"[{"operation": "UPDATE", "table": "users"}]"#)]
    #[case::null_field(r#"[{"operation": "UPDATE", "table": null, "description": "x"}]"#)]
    #[case::number(r"42")]
    fn malformed_payloads(#[case] raw: &str) {
        assert!(matches!(
            parse_findings(raw, &snippet()),
            Err(LlmError::Malformed(_))
        ));
    }

    #[rstest]
    #[case("")]
    #[case("   \n")]
    #[case("```json\n```")]
    fn blank_output_is_empty_response(#[case] raw: &str) {
        assert!(matches!(
            parse_findings(raw, &snippet()),
            Err(LlmError::EmptyResponse)
        ));
    }
}
