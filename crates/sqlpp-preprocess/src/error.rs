//! Preprocessing errors
//!
//! Every variant is fatal to the script being expanded. Display output follows
//! the compiler convention `<file>:<line>: error: <message>`.

use sqlpp_core::{Diagnostic, DiagnosticCode, Location};
use std::path::PathBuf;

/// Error during script preprocessing
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("{file}:{line}: error: {message}")]
    DirectiveSyntax {
        file: String,
        line: usize,
        message: String,
    },

    #[error("{file}:{line}: error: #end without matching #ifdef or #ifndef")]
    UnmatchedEnd { file: String, line: usize },

    #[error("{file}:{line}: error: unclosed conditional block '{directive} {name}' (missing #end)")]
    UnclosedConditional {
        file: String,
        /// Line of the outermost block left open
        line: usize,
        directive: &'static str,
        name: String,
        /// Number of blocks still open at end of input
        open: usize,
    },

    #[error("{file}:{line}: error: failed to include \"{}\": {source}", .target.display())]
    Include {
        file: String,
        line: usize,
        target: PathBuf,
        source: Box<PreprocessError>,
    },

    #[error("{file}:{line}: error: include cycle: \"{}\" is already being expanded", .target.display())]
    IncludeCycle {
        file: String,
        line: usize,
        target: PathBuf,
    },

    #[error("{file}:{line}: error: maximum include depth ({limit}) exceeded")]
    IncludeDepth {
        file: String,
        line: usize,
        limit: usize,
    },

    #[error("{path}: error: cannot read script: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl PreprocessError {
    /// File and line the error is attributed to
    pub fn location(&self) -> Location {
        match self {
            Self::DirectiveSyntax { file, line, .. }
            | Self::UnmatchedEnd { file, line }
            | Self::UnclosedConditional { file, line, .. }
            | Self::Include { file, line, .. }
            | Self::IncludeCycle { file, line, .. }
            | Self::IncludeDepth { file, line, .. } => Location::with_line(file.clone(), *line),
            Self::Io { path, .. } => Location::new(path.clone()),
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            Self::DirectiveSyntax { .. } | Self::UnmatchedEnd { .. } => DiagnosticCode::DirectiveSyntax,
            Self::UnclosedConditional { .. } => DiagnosticCode::UnbalancedConditional,
            Self::Include { .. } | Self::IncludeDepth { .. } => DiagnosticCode::IncludeFailed,
            Self::IncludeCycle { .. } => DiagnosticCode::IncludeCycle,
            Self::Io { .. } => DiagnosticCode::IoError,
        }
    }

    /// Message without the location prefix
    pub fn message(&self) -> String {
        match self {
            Self::DirectiveSyntax { message, .. } => message.clone(),
            Self::UnmatchedEnd { .. } => "#end without matching #ifdef or #ifndef".to_string(),
            Self::UnclosedConditional { directive, name, open, .. } => {
                if *open > 1 {
                    format!("unclosed conditional block '{} {}' and {} more (missing #end)", directive, name, open - 1)
                } else {
                    format!("unclosed conditional block '{} {}' (missing #end)", directive, name)
                }
            }
            Self::Include { target, source, .. } => {
                format!("failed to include \"{}\": {}", target.display(), source)
            }
            Self::IncludeCycle { target, .. } => {
                format!("include cycle: \"{}\" is already being expanded", target.display())
            }
            Self::IncludeDepth { limit, .. } => format!("maximum include depth ({}) exceeded", limit),
            Self::Io { source, .. } => format!("cannot read script: {}", source),
        }
    }

    /// Innermost error behind any chain of failed includes
    pub fn root_cause(&self) -> &PreprocessError {
        match self {
            Self::Include { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Convert to sqlpp diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code(), self.message()).with_location(self.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax(file: &str, line: usize) -> PreprocessError {
        PreprocessError::DirectiveSyntax {
            file: file.to_string(),
            line,
            message: "invalid #define syntax: missing name".to_string(),
        }
    }

    #[test]
    fn test_compiler_style_display() {
        assert_eq!(
            syntax("main.sql", 3).to_string(),
            "main.sql:3: error: invalid #define syntax: missing name"
        );
    }

    #[test]
    fn test_include_wraps_cause() {
        let err = PreprocessError::Include {
            file: "main.sql".to_string(),
            line: 2,
            target: PathBuf::from("lib/common.sqi"),
            source: Box::new(syntax("lib/common.sqi", 5)),
        };

        assert_eq!(err.location(), Location::with_line("main.sql", 2));
        assert_eq!(err.code(), DiagnosticCode::IncludeFailed);
        assert_eq!(err.root_cause().location(), Location::with_line("lib/common.sqi", 5));
        assert!(err.to_string().starts_with("main.sql:2: error: failed to include \"lib/common.sqi\": lib/common.sqi:5:"));
    }

    #[test]
    fn test_to_diagnostic() {
        let err = PreprocessError::UnclosedConditional {
            file: "main.sql".to_string(),
            line: 4,
            directive: "#ifdef",
            name: "DEBUG".to_string(),
            open: 2,
        };

        let diag = err.to_diagnostic();
        assert_eq!(diag.code, DiagnosticCode::UnbalancedConditional);
        assert_eq!(diag.location, Some(Location::with_line("main.sql", 4)));
        assert_eq!(
            diag.to_string(),
            "main.sql:4: error: unclosed conditional block '#ifdef DEBUG' and 1 more (missing #end)"
        );
    }
}
