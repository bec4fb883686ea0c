//! Executable units

use serde::{Deserialize, Serialize};
use sqlpp_core::Location;
use sqlpp_preprocess::SourceOrigin;
use std::fmt;

/// What a statement is handed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementKind {
    /// SQL text for the executor
    SqlBatch,

    /// Introspection directive for the schema introspector
    Directive,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlBatch => "SQL_BATCH",
            Self::Directive => "DIRECTIVE",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executable unit and the line it started on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Trimmed statement text; lines are joined with `\n`
    pub text: String,

    pub kind: StatementKind,

    /// Origin of the first content line
    pub origin: SourceOrigin,
}

impl Statement {
    pub fn sql(text: impl Into<String>, origin: SourceOrigin) -> Self {
        Self {
            text: text.into(),
            kind: StatementKind::SqlBatch,
            origin,
        }
    }

    pub fn directive(text: impl Into<String>, origin: SourceOrigin) -> Self {
        Self {
            text: text.into(),
            kind: StatementKind::Directive,
            origin,
        }
    }

    pub fn is_directive(&self) -> bool {
        self.kind == StatementKind::Directive
    }

    /// Location failures of this statement are attributed to
    pub fn location(&self) -> Location {
        self.origin.location()
    }
}
