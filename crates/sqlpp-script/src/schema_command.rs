//! Introspection directives (`@drivers`, `@schema-*`)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Introspection commands understood by the schema introspector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaCommand {
    /// `@drivers`
    Drivers,

    /// `@schema-all`
    All,

    /// `@schema-tables`
    Tables,

    /// `@schema-views`
    Views,

    /// `@schema-procedures`
    Procedures,

    /// `@schema-functions`
    Functions,
}

impl SchemaCommand {
    pub const ALL: [SchemaCommand; 6] = [
        Self::All,
        Self::Tables,
        Self::Views,
        Self::Procedures,
        Self::Functions,
        Self::Drivers,
    ];

    /// Directive names, in the order they are matched
    pub const NAMES: &'static [&'static str] = &[
        "@schema-all",
        "@schema-tables",
        "@schema-views",
        "@schema-procedures",
        "@schema-functions",
        "@drivers",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Drivers => "@drivers",
            Self::All => "@schema-all",
            Self::Tables => "@schema-tables",
            Self::Views => "@schema-views",
            Self::Procedures => "@schema-procedures",
            Self::Functions => "@schema-functions",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

impl fmt::Display for SchemaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed directive statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInvocation {
    pub command: SchemaCommand,

    /// Object name filter, quotes removed
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaCommandError {
    #[error("unknown introspection command '{0}'")]
    UnknownCommand(String),

    #[error("invalid filter for {command}: {message}")]
    InvalidFilter {
        command: SchemaCommand,
        message: String,
    },
}

/// Parse `@command [filter]`.
///
/// The filter is either one bare word or a single- or double-quoted string,
/// which may contain spaces.
pub fn parse_schema_command(text: &str) -> Result<SchemaInvocation, SchemaCommandError> {
    let text = text.trim();
    let (name, rest) = match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim()),
        None => (text, ""),
    };

    let command = SchemaCommand::from_name(name)
        .ok_or_else(|| SchemaCommandError::UnknownCommand(name.to_string()))?;

    let invalid = |message: &str| SchemaCommandError::InvalidFilter {
        command,
        message: message.to_string(),
    };

    let filter = match rest.chars().next() {
        None => None,
        Some(quote @ ('"' | '\'')) => {
            let inner = rest[1..]
                .strip_suffix(quote)
                .ok_or_else(|| invalid("unterminated quoted string"))?;
            if inner.contains(quote) {
                return Err(invalid("unexpected text after quoted string"));
            }
            Some(inner.to_string())
        }
        Some(_) if rest.contains(char::is_whitespace) => {
            return Err(invalid("expected a single word or a quoted string"));
        }
        Some(_) => Some(rest.to_string()),
    };

    Ok(SchemaInvocation { command, filter })
}
