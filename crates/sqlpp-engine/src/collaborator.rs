//! Collaborator seams
//!
//! The driver never talks to a data store itself. Executing SQL, rendering
//! results and enumerating schema objects are delegated to these traits.

use serde::{Deserialize, Serialize};
use sqlpp_core::Location;
use sqlpp_preprocess::SourceOrigin;
use sqlpp_script::{SchemaCommand, SchemaInvocation, Statement};

/// Outcome of running one SQL batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Statement text as executed
    pub statement: String,

    /// Where the statement starts in the user's script
    pub origin: SourceOrigin,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Rows changed by a non-query statement, when the executor knows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,

    /// Error reported by the data store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Empty successful result for `statement`
    pub fn new(statement: &Statement) -> Self {
        Self {
            statement: statement.text.clone(),
            origin: statement.origin.clone(),
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected: None,
            error: None,
        }
    }

    pub fn with_rows(mut self, columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    pub fn with_rows_affected(mut self, count: u64) -> Self {
        self.rows_affected = Some(count);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn location(&self) -> Location {
        self.origin.location()
    }
}

/// Runs SQL batches against a data store
pub trait StatementExecutor {
    /// Executor name for logs (e.g. "postgres", "dry-run")
    fn name(&self) -> &str;

    /// Execute one batch. Data-store failures are reported in
    /// [`ExecutionResult::error`], never by panicking.
    fn execute(&mut self, statement: &Statement) -> ExecutionResult;
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("Unsupported output format: {0}")]
    Unsupported(String),
}

/// Renders execution results
pub trait ResultFormatter {
    fn format_result(&mut self, result: &ExecutionResult) -> Result<(), FormatError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    #[error("{0} is not supported by this introspector")]
    Unsupported(SchemaCommand),

    #[error("Introspection failed: {0}")]
    Failed(String),
}

/// Answers `@drivers` and `@schema-*` directives
pub trait SchemaIntrospector {
    /// Directive names recognised by the statement assembler
    fn command_names(&self) -> Vec<String> {
        SchemaCommand::NAMES.iter().map(|name| name.to_string()).collect()
    }

    fn introspect(&mut self, invocation: &SchemaInvocation) -> Result<(), IntrospectError>;
}
