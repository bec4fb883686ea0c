//! Script preprocessing for sqlpp
//!
//! This crate handles:
//! - `#define` macros and whole-token substitution
//! - `#include` of other scripts, relative to the including file
//! - `#ifdef` / `#ifndef` / `#end` conditional blocks
//! - Tracking the file and line every output line came from
//!
//! The result is a flat list of [`RawLine`]s that the statement assembler
//! turns into executable statements.

pub mod directive;
pub mod macros;
pub mod conditional;
pub mod origin;
pub mod error;
pub mod expander;

pub use directive::{DirectiveKind, DirectiveLine};
pub use macros::{Define, MacroTable, MacroError};
pub use conditional::{ConditionalStack, ConditionalFrame, ConditionalKind, UnmatchedEnd};
pub use origin::{SourceOrigin, RawLine};
pub use error::PreprocessError;
pub use expander::{SourceExpander, ExpandOptions};
