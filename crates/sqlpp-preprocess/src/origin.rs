//! Source locations attached to every expanded line

use serde::{Deserialize, Serialize};
use sqlpp_core::Location;
use std::fmt;

/// Where a line of expanded text came from.
///
/// `current_*` is the file and line that was read. `origin_*` is reserved for
/// attributing through deeper invocation chains and currently mirrors
/// `current_*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceOrigin {
    pub current_file: String,
    pub current_line: usize,
    pub origin_file: String,
    pub origin_line: usize,
}

impl SourceOrigin {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        let file = file.into();
        Self {
            origin_file: file.clone(),
            origin_line: line,
            current_file: file,
            current_line: line,
        }
    }

    /// Location used for error attribution
    pub fn location(&self) -> Location {
        Location::with_line(self.origin_file.clone(), self.origin_line)
    }
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin_file, self.origin_line)
    }
}

/// One line of expanded output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    /// Line text after macro substitution, without the line terminator
    pub text: String,

    /// File and line the text was read from
    pub origin: SourceOrigin,
}

impl RawLine {
    pub fn new(text: impl Into<String>, origin: SourceOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}
