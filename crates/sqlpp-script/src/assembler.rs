//! Grouping expanded lines into statements

use sqlpp_preprocess::{RawLine, SourceOrigin};
use tracing::debug;

use crate::schema_command::SchemaCommand;
use crate::statement::Statement;

/// Batch delimiter keyword, matched case-insensitively
pub const DELIMITER: &str = "go";

/// Splits an expanded line stream into SQL batches and directives
#[derive(Debug, Clone)]
pub struct StatementAssembler {
    directive_names: Vec<String>,
    split_on_file_change: bool,
}

impl Default for StatementAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementAssembler {
    /// Assembler recognising the built-in introspection commands
    pub fn new() -> Self {
        Self::with_directive_names(SchemaCommand::NAMES.iter().copied())
    }

    /// Assembler recognising the given directive names, typically the ones an
    /// introspector reports it can handle
    pub fn with_directive_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            directive_names: names.into_iter().map(Into::into).collect(),
            split_on_file_change: true,
        }
    }

    /// End the current batch whenever consecutive content lines come from different files
    pub fn split_on_file_change(mut self, enabled: bool) -> Self {
        self.split_on_file_change = enabled;
        self
    }

    /// Trimmed line starts with a known directive name
    pub fn is_directive(&self, line: &str) -> bool {
        let line = line.trim();
        self.directive_names.iter().any(|name| line.starts_with(name.as_str()))
    }

    /// `go` alone or followed by whitespace, any case
    pub fn is_delimiter(line: &str) -> bool {
        line.split_whitespace()
            .next()
            .is_some_and(|head| head.eq_ignore_ascii_case(DELIMITER))
    }

    pub fn assemble<I>(&self, lines: I) -> Vec<Statement>
    where
        I: IntoIterator<Item = RawLine>,
    {
        let mut statements = Vec::new();
        let mut batch = Batch::default();

        for line in lines {
            if self.is_directive(&line.text) {
                batch.flush_into(&mut statements);
                let statement = Statement::directive(line.text.trim(), line.origin);
                debug!(origin = %statement.origin, text = %statement.text, "assembled directive");
                statements.push(statement);
                continue;
            }

            if Self::is_delimiter(&line.text) {
                batch.flush_into(&mut statements);
                continue;
            }

            if self.split_on_file_change && batch.crosses_file(&line) {
                batch.flush_into(&mut statements);
            }

            batch.push(line);
        }

        batch.flush_into(&mut statements);
        statements
    }
}

/// Lines accumulated since the last flush
#[derive(Debug, Default)]
struct Batch {
    text: String,

    /// Origin of the first non-blank line
    origin: Option<SourceOrigin>,

    /// File of the most recent non-blank line
    last_file: Option<String>,
}

impl Batch {
    fn push(&mut self, line: RawLine) {
        let blank = line.text.trim().is_empty();
        if blank && self.origin.is_none() {
            // leading blank lines never start a statement
            return;
        }

        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(&line.text);

        if !blank {
            self.last_file = Some(line.origin.current_file.clone());
            if self.origin.is_none() {
                self.origin = Some(line.origin);
            }
        }
    }

    fn crosses_file(&self, line: &RawLine) -> bool {
        if line.text.trim().is_empty() {
            return false;
        }
        self.last_file
            .as_deref()
            .is_some_and(|file| file != line.origin.current_file)
    }

    fn flush_into(&mut self, statements: &mut Vec<Statement>) {
        let batch = std::mem::take(self);
        if let Some(origin) = batch.origin {
            let statement = Statement::sql(batch.text.trim(), origin);
            debug!(origin = %statement.origin, bytes = statement.text.len(), "assembled batch");
            statements.push(statement);
        }
    }
}
