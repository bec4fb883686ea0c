//! Collaborators that print what would run instead of touching a data store

use std::io::{self, Write};

use sqlpp_core::OutputFormat;
use sqlpp_script::{SchemaInvocation, Statement};
use tracing::debug;

use crate::collaborator::{
    ExecutionResult, FormatError, IntrospectError, ResultFormatter, SchemaIntrospector, StatementExecutor,
};

/// Accepts every batch and reports no rows
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    executed: usize,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> usize {
        self.executed
    }
}

impl StatementExecutor for DryRunExecutor {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn execute(&mut self, statement: &Statement) -> ExecutionResult {
        self.executed += 1;
        debug!(origin = %statement.origin, "dry-run execute");
        ExecutionResult::new(statement)
    }
}

/// Writes each executed statement, or its error, to a writer
pub struct EchoFormatter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl EchoFormatter<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> EchoFormatter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultFormatter for EchoFormatter<W> {
    fn format_result(&mut self, result: &ExecutionResult) -> Result<(), FormatError> {
        match (self.format, &result.error) {
            (OutputFormat::Text, Some(error)) => {
                writeln!(self.writer, "{}: error: {}", result.location(), error)?;
            }
            (OutputFormat::Text, None) => {
                writeln!(self.writer, "-- {}", result.location())?;
                writeln!(self.writer, "{}", result.statement)?;
                if let Some(count) = result.rows_affected {
                    writeln!(self.writer, "-- {} row(s) affected", count)?;
                }
            }
            (OutputFormat::Json, _) => {
                let json = serde_json::to_string(result).map_err(|e| FormatError::Serialize(e.to_string()))?;
                writeln!(self.writer, "{}", json)?;
            }
        }

        Ok(())
    }
}

/// Reports each introspection directive it is asked to run
pub struct DryRunIntrospector<W: Write> {
    writer: W,
}

impl DryRunIntrospector<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DryRunIntrospector<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SchemaIntrospector for DryRunIntrospector<W> {
    fn introspect(&mut self, invocation: &SchemaInvocation) -> Result<(), IntrospectError> {
        let written = match &invocation.filter {
            Some(filter) => writeln!(self.writer, "-- {} (filter: {})", invocation.command, filter),
            None => writeln!(self.writer, "-- {}", invocation.command),
        };
        written.map_err(|e| IntrospectError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlpp_preprocess::SourceOrigin;
    use sqlpp_script::SchemaCommand;

    fn statement() -> Statement {
        Statement::sql("SELECT 1;", SourceOrigin::new("a.sql", 2))
    }

    #[test]
    fn test_dry_run_executor_counts() {
        let mut executor = DryRunExecutor::new();
        let result = executor.execute(&statement());
        assert!(!result.is_error());
        assert_eq!(executor.executed(), 1);
        assert_eq!(executor.name(), "dry-run");
    }

    #[test]
    fn test_echo_text() {
        let mut formatter = EchoFormatter::new(Vec::new(), OutputFormat::Text);
        formatter
            .format_result(&ExecutionResult::new(&statement()).with_rows_affected(2))
            .unwrap();

        let output = String::from_utf8(formatter.into_inner()).unwrap();
        assert_eq!(output, "-- a.sql:2\nSELECT 1;\n-- 2 row(s) affected\n");
    }

    #[test]
    fn test_echo_error_is_compiler_style() {
        let mut formatter = EchoFormatter::new(Vec::new(), OutputFormat::Text);
        formatter
            .format_result(&ExecutionResult::new(&statement()).with_error("relation \"t\" does not exist"))
            .unwrap();

        let output = String::from_utf8(formatter.into_inner()).unwrap();
        assert_eq!(output, "a.sql:2: error: relation \"t\" does not exist\n");
    }

    #[test]
    fn test_echo_json_error_stays_json() {
        let mut formatter = EchoFormatter::new(Vec::new(), OutputFormat::Json);
        formatter.format_result(&ExecutionResult::new(&statement())).unwrap();
        formatter
            .format_result(&ExecutionResult::new(&statement()).with_error("relation \"t\" does not exist"))
            .unwrap();

        let output = String::from_utf8(formatter.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].get("error").is_none());
        assert_eq!(lines[1]["error"], "relation \"t\" does not exist");
        assert_eq!(lines[1]["origin"]["current_line"], 2);
    }

    #[test]
    fn test_echo_json() {
        let mut formatter = EchoFormatter::new(Vec::new(), OutputFormat::Json);
        formatter.format_result(&ExecutionResult::new(&statement())).unwrap();

        let output = String::from_utf8(formatter.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["statement"], "SELECT 1;");
        assert_eq!(value["origin"]["current_line"], 2);
    }

    #[test]
    fn test_dry_run_introspector() {
        let mut introspector = DryRunIntrospector::new(Vec::new());
        introspector
            .introspect(&SchemaInvocation {
                command: SchemaCommand::Tables,
                filter: Some("user".to_string()),
            })
            .unwrap();
        introspector
            .introspect(&SchemaInvocation {
                command: SchemaCommand::Drivers,
                filter: None,
            })
            .unwrap();

        let output = String::from_utf8(introspector.into_inner()).unwrap();
        assert_eq!(output, "-- @schema-tables (filter: user)\n-- @drivers\n");
    }
}
