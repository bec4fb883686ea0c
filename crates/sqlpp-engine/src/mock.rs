//! Mock collaborators for testing
//!
//! Record every statement, result and directive they see, and fail on
//! request:
//! - [`MockExecutor`] fails statements whose text contains a marker
//! - [`RecordingFormatter`] can be told to fail after N results
//! - [`MockIntrospector`] can reject chosen commands

use std::collections::HashSet;

use sqlpp_script::{SchemaCommand, SchemaInvocation, Statement};

use crate::collaborator::{
    ExecutionResult, FormatError, IntrospectError, ResultFormatter, SchemaIntrospector, StatementExecutor,
};

/// Executor that records statements and fails on configured markers
#[derive(Debug, Default)]
pub struct MockExecutor {
    executed: Vec<Statement>,

    /// Statements containing any of these substrings fail
    fail_markers: Vec<String>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement whose text contains `marker`
    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    pub fn executed(&self) -> &[Statement] {
        &self.executed
    }

    /// Executed statement texts, in order
    pub fn texts(&self) -> Vec<&str> {
        self.executed.iter().map(|s| s.text.as_str()).collect()
    }
}

impl StatementExecutor for MockExecutor {
    fn name(&self) -> &str {
        "Mock"
    }

    fn execute(&mut self, statement: &Statement) -> ExecutionResult {
        self.executed.push(statement.clone());

        let result = ExecutionResult::new(statement);
        match self.fail_markers.iter().find(|marker| statement.text.contains(marker.as_str())) {
            Some(marker) => result.with_error(format!("mock failure on '{}'", marker)),
            None => result.with_rows_affected(0),
        }
    }
}

/// Formatter that keeps every result it is given
#[derive(Debug, Default)]
pub struct RecordingFormatter {
    results: Vec<ExecutionResult>,
    fail_after: Option<usize>,
}

impl RecordingFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail once `count` results have been recorded
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }
}

impl ResultFormatter for RecordingFormatter {
    fn format_result(&mut self, result: &ExecutionResult) -> Result<(), FormatError> {
        if self.fail_after.is_some_and(|limit| self.results.len() >= limit) {
            return Err(FormatError::Unsupported("mock".to_string()));
        }
        self.results.push(result.clone());
        Ok(())
    }
}

/// Introspector that records invocations
#[derive(Debug, Default)]
pub struct MockIntrospector {
    invocations: Vec<SchemaInvocation>,
    rejected: HashSet<SchemaCommand>,
    names: Option<Vec<String>>,
}

impl MockIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `command` as unsupported
    pub fn reject(mut self, command: SchemaCommand) -> Self {
        self.rejected.insert(command);
        self
    }

    /// Advertise only these directive names to the assembler
    pub fn with_command_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn invocations(&self) -> &[SchemaInvocation] {
        &self.invocations
    }
}

impl SchemaIntrospector for MockIntrospector {
    fn command_names(&self) -> Vec<String> {
        match &self.names {
            Some(names) => names.clone(),
            None => SchemaCommand::NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }

    fn introspect(&mut self, invocation: &SchemaInvocation) -> Result<(), IntrospectError> {
        self.invocations.push(invocation.clone());
        if self.rejected.contains(&invocation.command) {
            return Err(IntrospectError::Unsupported(invocation.command));
        }
        Ok(())
    }
}
