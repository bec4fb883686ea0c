//! Macro table for `#define`
//!
//! Holds name/value bindings for one pipeline invocation and substitutes them
//! into content lines.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::directive::{is_identifier, strip_line_comment, unquote};

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// A `#define` binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Define {
    pub name: String,
    pub value: String,
}

/// Errors raised while storing a define
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    #[error("missing name")]
    MissingName,

    #[error("'{0}' is not an identifier")]
    InvalidName(String),

    #[error("missing value for '{0}'")]
    MissingValue(String),
}

/// Name to value bindings, scoped to one expansion run
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    defines: BTreeMap<String, Define>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw_value` the way `#define NAME raw_value` does and store it.
    ///
    /// A trailing `// comment` outside quotes is dropped, the rest is trimmed
    /// and one layer of quotes is removed when they enclose the whole value.
    /// Redefinition overwrites.
    pub fn define(&mut self, name: &str, raw_value: &str) -> Result<(), MacroError> {
        Self::check_name(name)?;

        let value = strip_line_comment(raw_value).trim();
        if value.is_empty() {
            return Err(MacroError::MissingValue(name.to_string()));
        }

        self.insert(name, unquote(value).to_string());
        Ok(())
    }

    /// Store a value verbatim, without comment or quote handling
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), MacroError> {
        Self::check_name(name)?;
        self.insert(name, value.into());
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(|define| define.value.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Define> {
        self.defines.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Define> {
        self.defines.remove(name)
    }

    pub fn clear(&mut self) {
        self.defines.clear();
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    /// Defines in name order
    pub fn iter(&self) -> impl Iterator<Item = &Define> {
        self.defines.values()
    }

    /// Snapshot copy; changing it does not affect the table
    pub fn defines(&self) -> BTreeMap<String, Define> {
        self.defines.clone()
    }

    /// Replace every whole-token occurrence of a known name with its value.
    ///
    /// All names are replaced in one left-to-right pass over the word tokens
    /// of `line`, so substituted text is never scanned again.
    pub fn substitute<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if self.defines.is_empty() {
            return Cow::Borrowed(line);
        }

        WORD.replace_all(line, |caps: &Captures<'_>| {
            let token = &caps[0];
            self.lookup(token).unwrap_or(token).to_string()
        })
    }

    fn check_name(name: &str) -> Result<(), MacroError> {
        if name.is_empty() {
            return Err(MacroError::MissingName);
        }
        if !is_identifier(name) {
            return Err(MacroError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn insert(&mut self, name: &str, value: String) {
        self.defines.insert(
            name.to_string(),
            Define {
                name: name.to_string(),
                value,
            },
        );
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MacroTable {
    /// Collect verbatim bindings. Entries whose name is not an identifier are skipped.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (name, value) in iter {
            let name: String = name.into();
            if table.set(&name, value).is_err() {
                tracing::warn!(name = %name, "ignoring define with invalid name");
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MacroTable {
        let mut table = MacroTable::new();
        table.set("TRUE", "Y").unwrap();
        table.set("MAX_LOOPS", "100").unwrap();
        table.set("PROC_NAME", "stored-proc-name").unwrap();
        table
    }

    #[test]
    fn test_define_values() {
        let cases = [
            ("TRUE", "Y", "Y"),
            ("MAX_LOOPS", "100", "100"),
            ("PROC_NAME", "\"stored-proc-name\"", "stored-proc-name"),
            ("FOOBAR", "\"some text to use\" // some comment", "some text to use"),
            ("SINGLE", "'value'", "value"),
            ("SPACED", "  two words  ", "two words"),
            ("URL", "\"http://example.com\" // home", "http://example.com"),
            ("EMPTY", "\"\"", ""),
            ("PAIR", "'a', 'b'", "'a', 'b'"),
            ("APOS", "it's // note", "it's"),
        ];

        let mut macros = MacroTable::new();
        for (name, raw, expected) in cases {
            macros.define(name, raw).unwrap();
            assert_eq!(macros.lookup(name), Some(expected), "define {}", name);
        }
    }

    #[test]
    fn test_define_errors() {
        let mut macros = MacroTable::new();
        assert_eq!(macros.define("", "1"), Err(MacroError::MissingName));
        assert_eq!(macros.define("INVALID", ""), Err(MacroError::MissingValue("INVALID".into())));
        assert_eq!(
            macros.define("INVALID", "   // only a comment"),
            Err(MacroError::MissingValue("INVALID".into()))
        );
        assert_eq!(macros.define("A-B", "1"), Err(MacroError::InvalidName("A-B".into())));
        assert!(macros.is_empty());
    }

    #[test]
    fn test_redefine_overwrites() {
        let mut macros = MacroTable::new();
        macros.define("N", "1").unwrap();
        macros.define("N", "2").unwrap();
        assert_eq!(macros.lookup("N"), Some("2"));
        assert_eq!(macros.len(), 1);
    }

    #[test]
    fn test_substitute() {
        let macros = table();
        let cases = [
            ("SELECT * FROM table WHERE active = TRUE", "SELECT * FROM table WHERE active = Y"),
            ("LIMIT MAX_LOOPS", "LIMIT 100"),
            ("EXEC PROC_NAME", "EXEC stored-proc-name"),
            ("No substitution needed", "No substitution needed"),
            ("TRUE and MAX_LOOPS in same line", "Y and 100 in same line"),
            ("TRUELY should not be replaced", "TRUELY should not be replaced"),
            ("x.TRUE,(TRUE)", "x.Y,(Y)"),
        ];

        for (input, expected) in cases {
            assert_eq!(macros.substitute(input), expected);
        }
    }

    #[test]
    fn test_substitute_is_case_sensitive() {
        assert_eq!(table().substitute("true True TRUE"), "true True Y");
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let mut macros = MacroTable::new();
        macros.set("A", "B").unwrap();
        macros.set("B", "A").unwrap();
        macros.set("LOOP", "LOOP LOOP").unwrap();

        assert_eq!(macros.substitute("A B"), "B A");
        assert_eq!(macros.substitute("LOOP"), "LOOP LOOP");
    }

    #[test]
    fn test_substitute_idempotent_on_expanded_line() {
        let macros = table();
        let once = macros.substitute("WHERE flag = TRUE LIMIT MAX_LOOPS").into_owned();
        assert_eq!(macros.substitute(&once), once);
    }

    #[test]
    fn test_empty_table_borrows() {
        let macros = MacroTable::new();
        assert!(matches!(macros.substitute("SELECT 1"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_defines_snapshot_is_independent() {
        let mut macros = MacroTable::new();
        macros.set("TEST1", "value1").unwrap();
        macros.set("TEST2", "value2").unwrap();

        let mut snapshot = macros.defines();
        assert_eq!(snapshot.len(), 2);
        snapshot.get_mut("TEST1").unwrap().value = "modified".to_string();

        assert_eq!(macros.lookup("TEST1"), Some("value1"));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut macros = table();
        assert!(macros.remove("TRUE").is_some());
        assert!(!macros.contains("TRUE"));
        assert_eq!(macros.substitute("TRUE"), "TRUE");

        macros.clear();
        assert!(macros.is_empty());
    }

    #[test]
    fn test_from_iterator_skips_bad_names() {
        let macros: MacroTable = vec![("ENV", "dev"), ("BAD NAME", "x")].into_iter().collect();
        assert_eq!(macros.len(), 1);
        assert_eq!(macros.lookup("ENV"), Some("dev"));
    }
}
