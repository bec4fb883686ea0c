//! Statement assembly for sqlpp
//!
//! Turns the annotated line stream produced by `sqlpp-preprocess` into
//! executable units:
//! - SQL batches terminated by a `go` line
//! - single-line introspection directives such as `@schema-tables`
//!
//! [`ScriptPipeline`] wires the expander and the assembler together.

pub mod statement;
pub mod schema_command;
pub mod assembler;
pub mod pipeline;

pub use statement::{Statement, StatementKind};
pub use schema_command::{SchemaCommand, SchemaInvocation, SchemaCommandError, parse_schema_command};
pub use assembler::StatementAssembler;
pub use pipeline::ScriptPipeline;
