//! Script processor
//!
//! Compiles scripts with a [`ScriptPipeline`] and feeds the statements to the
//! collaborators. Failures are recorded in the run [`Report`]; whether they
//! stop the run depends on `end_on_error`.

use std::io::{self, BufRead};
use std::path::Path;

use chrono::{DateTime, Utc};
use sqlpp_core::{Config, Diagnostic, DiagnosticCode, Location, Report};
use sqlpp_preprocess::{MacroError, PreprocessError};
use sqlpp_script::{parse_schema_command, ScriptPipeline, Statement, StatementAssembler, StatementKind};
use tracing::{debug, info, warn};

use crate::collaborator::{FormatError, ResultFormatter, SchemaIntrospector, StatementExecutor};
use crate::discovery::{find_scripts, DiscoveryError};

/// Driver settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorOptions {
    /// Stop at the first failed statement or script
    pub end_on_error: bool,

    /// Extensions picked up by [`Processor::process_directory`]
    pub extensions: Vec<String>,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            end_on_error: false,
            extensions: vec!["sql".to_string()],
        }
    }
}

impl ProcessorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            end_on_error: config.end_on_error,
            extensions: config.preprocess.extensions.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// A statement failed while `end_on_error` is set
    #[error("{diagnostic}")]
    Stopped { diagnostic: Diagnostic },

    #[error("{location}: error: cannot format result: {source}")]
    Format {
        location: Location,
        source: FormatError,
    },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Invalid define: {0}")]
    InvalidDefine(#[from] MacroError),
}

impl ProcessError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Preprocess(err) => err.to_diagnostic(),
            Self::Stopped { diagnostic } => diagnostic.clone(),
            Self::Format { location, source } => {
                Diagnostic::error(DiagnosticCode::FormatFailed, format!("cannot format result: {}", source))
                    .with_location(location.clone())
            }
            Self::Discovery(err) => Diagnostic::error(DiagnosticCode::IoError, err.to_string()),
            Self::InvalidDefine(err) => Diagnostic::error(DiagnosticCode::ConfigError, err.to_string()),
        }
    }
}

/// Runs scripts against an executor, a formatter and an introspector
pub struct Processor<E, F, I> {
    executor: E,
    formatter: F,
    introspector: I,
    pipeline: ScriptPipeline,
    options: ProcessorOptions,
    report: Report,
}

impl<E, F, I> Processor<E, F, I>
where
    E: StatementExecutor,
    F: ResultFormatter,
    I: SchemaIntrospector,
{
    /// Processor with default options and no predefined macros
    pub fn new(executor: E, formatter: F, introspector: I) -> Self {
        let assembler = StatementAssembler::with_directive_names(introspector.command_names());
        Self {
            executor,
            formatter,
            introspector,
            pipeline: ScriptPipeline::new().with_assembler(assembler),
            options: ProcessorOptions::default(),
            report: Report::new(),
        }
    }

    /// Processor configured from `config`
    pub fn from_config(config: &Config, executor: E, formatter: F, introspector: I) -> Result<Self, ProcessError> {
        let assembler = StatementAssembler::with_directive_names(introspector.command_names())
            .split_on_file_change(config.assemble.split_on_file_change);
        let pipeline = ScriptPipeline::from_config(config)?.with_assembler(assembler);

        Ok(Self {
            executor,
            formatter,
            introspector,
            pipeline,
            options: ProcessorOptions::from_config(config),
            report: Report::new(),
        })
    }

    pub fn with_options(mut self, options: ProcessorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    pub fn pipeline(&self) -> &ScriptPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut ScriptPipeline {
        &mut self.pipeline
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn formatter(&self) -> &F {
        &self.formatter
    }

    pub fn introspector(&self) -> &I {
        &self.introspector
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    pub fn into_parts(self) -> (E, F, I, Report) {
        (self.executor, self.formatter, self.introspector, self.report)
    }

    /// Expand, assemble and execute one script file
    pub fn process_file(&mut self, path: &Path) -> Result<(), ProcessError> {
        info!(path = %path.display(), executor = self.executor.name(), "processing script");
        let compiled = self.pipeline.compile_file(path);
        self.run_compiled(compiled)
    }

    /// Same as [`process_file`](Self::process_file) for a stream, reported as `name`
    pub fn process_reader<R: BufRead>(&mut self, reader: R, name: &str) -> Result<(), ProcessError> {
        info!(script = name, executor = self.executor.name(), "processing stream");
        let compiled = self.pipeline.compile_reader(reader, name);
        self.run_compiled(compiled)
    }

    pub fn process_stdin(&mut self) -> Result<(), ProcessError> {
        let stdin = io::stdin();
        self.process_reader(stdin.lock(), "<stdin>")
    }

    /// Process every matching script under `dir` in file-name order.
    ///
    /// Returns the number of scripts found. Without `end_on_error` a failed
    /// script is recorded and the next one is processed. A formatter failure
    /// always ends the run.
    pub fn process_directory(&mut self, dir: &Path, newer_than: Option<DateTime<Utc>>) -> Result<usize, ProcessError> {
        let scripts = match find_scripts(dir, &self.options.extensions, newer_than) {
            Ok(scripts) => scripts,
            Err(err) => {
                let err = ProcessError::Discovery(err);
                self.report
                    .add_diagnostic(err.to_diagnostic().with_location(Location::new(dir.display().to_string())));
                return Err(err);
            }
        };

        info!(dir = %dir.display(), count = scripts.len(), "found scripts");

        for script in &scripts {
            if let Err(err) = self.process_file(script) {
                if self.options.end_on_error || matches!(err, ProcessError::Format { .. }) {
                    return Err(err);
                }
                warn!(path = %script.display(), error = %err, "script failed, continuing");
            }
        }

        Ok(scripts.len())
    }

    /// Run already assembled statements
    pub fn execute_statements(&mut self, statements: &[Statement]) -> Result<(), ProcessError> {
        for statement in statements {
            let failure = match statement.kind {
                StatementKind::Directive => self.run_directive(statement),
                StatementKind::SqlBatch => self.run_batch(statement)?,
            };
            self.report.summary.statements_executed += 1;

            if let Some(diagnostic) = failure {
                self.report.summary.statements_failed += 1;
                self.report.add_diagnostic(diagnostic.clone());

                if self.options.end_on_error {
                    return Err(ProcessError::Stopped { diagnostic });
                }
                warn!(%diagnostic, "statement failed, continuing");
            }
        }

        Ok(())
    }

    fn run_compiled(&mut self, compiled: Result<Vec<Statement>, PreprocessError>) -> Result<(), ProcessError> {
        let result = match compiled {
            Ok(statements) => self.execute_statements(&statements),
            Err(err) => {
                self.report.add_diagnostic(err.to_diagnostic());
                Err(ProcessError::Preprocess(err))
            }
        };

        match &result {
            Ok(()) => self.report.summary.scripts_processed += 1,
            Err(ProcessError::Format { location, source }) => {
                self.report.summary.scripts_failed += 1;
                let diagnostic = Diagnostic::error(DiagnosticCode::FormatFailed, format!("cannot format result: {}", source))
                    .with_location(location.clone());
                self.report.add_diagnostic(diagnostic);
            }
            Err(_) => self.report.summary.scripts_failed += 1,
        }

        result
    }

    fn run_directive(&mut self, statement: &Statement) -> Option<Diagnostic> {
        let failure = parse_schema_command(&statement.text)
            .map_err(|e| e.to_string())
            .and_then(|invocation| {
                debug!(origin = %statement.origin, command = %invocation.command, "introspect");
                self.introspector.introspect(&invocation).map_err(|e| e.to_string())
            })
            .err()?;

        Some(Diagnostic::error(DiagnosticCode::SchemaCommandFailed, failure).with_location(statement.location()))
    }

    /// Formatter failures end the run regardless of `end_on_error`
    fn run_batch(&mut self, statement: &Statement) -> Result<Option<Diagnostic>, ProcessError> {
        debug!(origin = %statement.origin, "execute");
        let result = self.executor.execute(statement);

        self.formatter
            .format_result(&result)
            .map_err(|source| ProcessError::Format {
                location: statement.location(),
                source,
            })?;

        Ok(result.error.map(|error| {
            Diagnostic::error(DiagnosticCode::ExecutionFailed, error).with_location(statement.location())
        }))
    }
}
