//! sqlpp Core
//!
//! Core domain model shared by every sqlpp crate: diagnostics, configuration
//! and the run report.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{matches_extension, Config, ConfigError, OutputFormat, PreprocessConfig, AssembleConfig, CONFIG_FILE_NAME};
