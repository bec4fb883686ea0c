//! Script driver for sqlpp
//!
//! Runs compiled scripts against external collaborators:
//! - [`StatementExecutor`] receives SQL batches
//! - [`ResultFormatter`] renders each execution result
//! - [`SchemaIntrospector`] handles `@drivers` and `@schema-*` directives
//!
//! The [`Processor`] applies the stop-on-error policy across statements and
//! scripts and records everything in a [`sqlpp_core::Report`].

pub mod collaborator;
pub mod discovery;
pub mod dry_run;
pub mod mock;
pub mod processor;

pub use collaborator::{
    ExecutionResult, FormatError, IntrospectError, ResultFormatter, SchemaIntrospector, StatementExecutor,
};
pub use discovery::{find_scripts, parse_newer_than, DiscoveryError};
pub use dry_run::{DryRunExecutor, DryRunIntrospector, EchoFormatter};
pub use processor::{ProcessError, Processor, ProcessorOptions};
