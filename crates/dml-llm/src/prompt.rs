//! The instructions every provider sends.

use dml_core::CodeSnippet;

/// Task description and output contract.
pub const INSTRUCTIONS: &str = "\
You review source code for SQL data manipulation statements.

Report only statements that are actually executed against a database:
1. Consider only INSERT, UPDATE, DELETE and MERGE statements. Ignore SELECT and DDL.
2. Ignore those keywords when they only appear in comments, identifiers, log messages or other strings that are not queries.
3. For every statement you report, give the operation, the literal target table name and a one-sentence description of the data it changes.
4. If the table name is built at runtime or held in a variable, report the table as \"ambiguous\".
5. If there is nothing to report, return an empty list.

Answer with a JSON object with exactly one key, \"dml_statements\", whose value is an array of objects with the string keys \"operation\", \"table\" and \"description\".";

/// The code block sent as the user turn.
#[must_use]
pub fn snippet_block(snippet: &CodeSnippet) -> String {
    format!(
        "File: {}\n\nCode snippet:\n```\n{}\n```",
        snippet.file_path, snippet.code
    )
}

/// Instructions and code in a single prompt, for providers without a
/// separate system turn.
#[must_use]
pub fn full_prompt(snippet: &CodeSnippet) -> String {
    format!("{INSTRUCTIONS}\n\n{}", snippet_block(snippet))
}
