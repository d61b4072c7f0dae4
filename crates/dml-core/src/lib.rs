//! # dml-core
//!
//! Core types, ports, and the run orchestrator for the DML catalog bot.
//!
//! This crate has no I/O of its own. It provides:
//! - The data model shared by every adapter (snippets, findings, catalogs)
//! - The three ports the orchestrator is built against: [`SnippetSource`],
//!   [`Classifier`], and [`ResultSink`]
//! - [`Orchestrator`], which drains a source, classifies each snippet, and
//!   hands the aggregated catalogs to a sink
//! - Cross-cutting error types

pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod ports;

pub use errors::SinkError;
pub use models::{AMBIGUOUS_TABLE, CodeSnippet, DmlOperation, Finding, RejectedSnippet, RepoCatalog};
pub use orchestrator::{Orchestrator, RunOptions, RunSummary};
pub use ports::{Classifier, ResultSink, SnippetSource};
