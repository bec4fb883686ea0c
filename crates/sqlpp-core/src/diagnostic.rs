//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Preprocessor directives (1xxx)
    /// A `#define`, `#include`, `#ifdef`, `#ifndef` or `#end` line is malformed
    DirectiveSyntax,

    /// A conditional block was left open at end of input
    UnbalancedConditional,

    // Inclusion (2xxx)
    /// An included script could not be read or failed to expand
    IncludeFailed,

    /// A script includes itself, directly or through other scripts
    IncludeCycle,

    /// Reading a script failed
    IoError,

    // Execution (3xxx)
    /// The executor reported an error for a statement
    ExecutionFailed,

    /// An introspection directive could not be handled
    SchemaCommandFailed,

    /// The formatter could not render a result
    FormatFailed,

    // Configuration (4xxx)
    /// Configuration file is missing, unreadable or invalid
    ConfigError,

    // General warnings (9xxx)
    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectiveSyntax => "DIRECTIVE_SYNTAX",
            Self::UnbalancedConditional => "UNBALANCED_CONDITIONAL",
            Self::IncludeFailed => "INCLUDE_FAILED",
            Self::IncludeCycle => "INCLUDE_CYCLE",
            Self::IoError => "IO_ERROR",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::SchemaCommandFailed => "SCHEMA_COMMAND_FAILED",
            Self::FormatFailed => "FORMAT_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - reported but processing continued
    Warn,

    /// Error - the script invocation failed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path as given on the command line or resolved from an include
    pub file: String,

    /// Optional line number (1-indexed)
    pub line: Option<usize>,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    /// Create a location with file and line number
    pub fn with_line(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => write!(f, "{}", self.file),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Source location (best-effort)
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
        }
    }

    /// Shorthand for an error-severity diagnostic
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Downgrade or upgrade the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Compiler-style rendering: `<file>:<line>: <severity>: <message>`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", location, self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // Ensure codes are stable strings
        assert_eq!(DiagnosticCode::DirectiveSyntax.as_str(), "DIRECTIVE_SYNTAX");
        assert_eq!(DiagnosticCode::UnbalancedConditional.as_str(), "UNBALANCED_CONDITIONAL");
        assert_eq!(DiagnosticCode::IncludeCycle.to_string(), "INCLUDE_CYCLE");
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::error(DiagnosticCode::DirectiveSyntax, "invalid #define syntax")
            .with_location(Location::with_line("scripts/setup.sql", 42));

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("DIRECTIVE_SYNTAX"));
        assert!(json.contains("\"error\""));
        assert!(json.contains("scripts/setup.sql"));
    }

    #[test]
    fn compiler_style_display() {
        let diag = Diagnostic::error(DiagnosticCode::DirectiveSyntax, "invalid #define syntax")
            .with_location(Location::with_line("main.sql", 3));
        assert_eq!(diag.to_string(), "main.sql:3: error: invalid #define syntax");

        let no_line = Diagnostic::error(DiagnosticCode::UnbalancedConditional, "unclosed conditional block")
            .with_location(Location::new("main.sql"));
        assert_eq!(no_line.to_string(), "main.sql: error: unclosed conditional block");

        let bare = Diagnostic::new(DiagnosticCode::Warning, Severity::Warn, "no scripts found");
        assert_eq!(bare.to_string(), "warning: no scripts found");
    }
}
