//! Directive recognition and argument parsing
//!
//! Every preprocessor keyword lives in [`DIRECTIVES`]. A line is a directive
//! when the first whitespace-delimited token of the trimmed line is one of
//! those keywords; nothing else about the line is inspected.

use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("identifier pattern is valid"));

/// Preprocessor directive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `#define NAME VALUE`
    Define,

    /// `#include "path"`
    Include,

    /// `#ifdef NAME`
    IfDef,

    /// `#ifndef NAME`
    IfNDef,

    /// `#end`
    End,
}

/// Keyword table, matched against the leading token of a trimmed line
pub const DIRECTIVES: &[(&str, DirectiveKind)] = &[
    ("#define", DirectiveKind::Define),
    ("#include", DirectiveKind::Include),
    ("#ifdef", DirectiveKind::IfDef),
    ("#ifndef", DirectiveKind::IfNDef),
    ("#end", DirectiveKind::End),
];

impl DirectiveKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Define => "#define",
            Self::Include => "#include",
            Self::IfDef => "#ifdef",
            Self::IfNDef => "#ifndef",
            Self::End => "#end",
        }
    }

    /// Conditional directives are processed even inside inactive blocks
    pub fn is_conditional(&self) -> bool {
        matches!(self, Self::IfDef | Self::IfNDef | Self::End)
    }
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A directive line split into its keyword and the text after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveLine<'a> {
    pub kind: DirectiveKind,

    /// Everything after the keyword, leading whitespace removed
    pub args: &'a str,
}

/// Classify a physical line. Returns `None` for ordinary content.
pub fn classify(line: &str) -> Option<DirectiveLine<'_>> {
    let (head, args) = split_first_token(line.trim());

    DIRECTIVES
        .iter()
        .find(|(keyword, _)| *keyword == head)
        .map(|(_, kind)| DirectiveLine { kind: *kind, args })
}

/// Split off the first whitespace-delimited token
pub fn split_first_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

/// Check that a name is a single word token (`\w+`)
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Cut a trailing `// comment`, ignoring `//` inside single or double quotes.
///
/// A quote with no closing partner later on the line is an ordinary
/// character, so `it's // note` still loses its comment.
pub fn strip_line_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        match (quote, c) {
            (Some(open), _) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') if text[index + 1..].contains(c) => quote = Some(c),
            (None, '/') if matches!(chars.peek(), Some((_, '/'))) => return &text[..index],
            (None, _) => {}
        }
    }

    text
}

/// Remove one layer of `"` or `'` quotes when they enclose the whole text.
///
/// The closing quote must be the first unescaped copy of the opening one, so
/// `'a', 'b'` is two literals and stays verbatim.
pub fn unquote(text: &str) -> &str {
    let Some(open) = text.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return text;
    };

    let inner = &text[1..];
    let mut escaped = false;
    for (index, c) in inner.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            _ if c == open => {
                return if index + 1 == inner.len() { &inner[..index] } else { text };
            }
            _ => {}
        }
    }

    text
}

/// Parse the argument of `#include`: a double-quoted path
pub fn parse_include(args: &str) -> Result<&str, String> {
    let target = strip_line_comment(args).trim();

    let inner = target
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| "invalid #include syntax: expected a double-quoted path".to_string())?;

    if inner.is_empty() || inner.contains('"') {
        return Err("invalid #include syntax: expected a double-quoted path".to_string());
    }

    Ok(inner)
}

/// Parse the argument of `#ifdef` / `#ifndef`: exactly one identifier
pub fn parse_conditional_name(kind: DirectiveKind, args: &str) -> Result<&str, String> {
    let mut tokens = strip_line_comment(args).split_whitespace();

    match (tokens.next(), tokens.next()) {
        (Some(name), None) if is_identifier(name) => Ok(name),
        (None, _) => Err(format!("invalid {} syntax: missing name", kind)),
        (Some(_), Some(_)) => Err(format!("invalid {} syntax: expected exactly one name", kind)),
        (Some(name), None) => Err(format!("invalid {} syntax: '{}' is not an identifier", kind, name)),
    }
}

/// Check that `#end` carries nothing but an optional comment
pub fn parse_end(args: &str) -> Result<(), String> {
    if strip_line_comment(args).trim().is_empty() {
        Ok(())
    } else {
        Err("invalid #end syntax: unexpected text after #end".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        let line = classify("  #define TRUE Y").unwrap();
        assert_eq!(line.kind, DirectiveKind::Define);
        assert_eq!(line.args, "TRUE Y");

        assert_eq!(classify("#include \"a.sqi\"").unwrap().kind, DirectiveKind::Include);
        assert_eq!(classify("#ifdef\tDEBUG").unwrap().kind, DirectiveKind::IfDef);
        assert_eq!(classify("#ifndef DEBUG").unwrap().kind, DirectiveKind::IfNDef);
        assert_eq!(classify("#end").unwrap().args, "");
    }

    #[test]
    fn test_classify_ordinary_lines() {
        assert!(classify("SELECT '#define X 1';").is_none());
        assert!(classify("#defined").is_none());
        assert!(classify("#endif").is_none());
        assert!(classify("-- #include \"x\"").is_none());
        assert!(classify("").is_none());
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert!(classify("#DEFINE X 1").is_none());
        assert!(classify("#Include \"a\"").is_none());
    }

    #[test]
    fn test_strip_line_comment() {
        assert_eq!(strip_line_comment("100 // max loops"), "100 ");
        assert_eq!(strip_line_comment("\"http://example.com\""), "\"http://example.com\"");
        assert_eq!(strip_line_comment("'a//b' // note"), "'a//b' ");
        assert_eq!(strip_line_comment("a / b"), "a / b");
        assert_eq!(strip_line_comment("// all comment"), "");
        assert_eq!(strip_line_comment("it's // note"), "it's ");
        assert_eq!(strip_line_comment("'a' it's // note"), "'a' it's ");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"stored-proc-name\""), "stored-proc-name");
        assert_eq!(unquote("'value'"), "value");
        assert_eq!(unquote("\"mixed'"), "\"mixed'");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("\"\"\"\""), "\"\"\"\"");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("'a', 'b'"), "'a', 'b'");
        assert_eq!(unquote("\"say \\\"hi\\\"\""), "say \\\"hi\\\"");
        assert_eq!(unquote("plain text"), "plain text");
    }

    #[test]
    fn test_parse_include() {
        assert_eq!(parse_include("\"common/setup.sqi\"").unwrap(), "common/setup.sqi");
        assert_eq!(parse_include("\"a.sqi\" // shared").unwrap(), "a.sqi");
        assert!(parse_include("a.sqi").is_err());
        assert!(parse_include("\"a.sqi").is_err());
        assert!(parse_include("\"\"").is_err());
        assert!(parse_include("").is_err());
    }

    #[test]
    fn test_parse_conditional_name() {
        assert_eq!(parse_conditional_name(DirectiveKind::IfDef, "DEBUG").unwrap(), "DEBUG");
        assert_eq!(
            parse_conditional_name(DirectiveKind::IfNDef, "DEBUG // only in dev").unwrap(),
            "DEBUG"
        );

        let missing = parse_conditional_name(DirectiveKind::IfDef, "").unwrap_err();
        assert!(missing.contains("#ifdef"));
        assert!(parse_conditional_name(DirectiveKind::IfDef, "A B").is_err());
        assert!(parse_conditional_name(DirectiveKind::IfNDef, "A-B").is_err());
    }

    #[test]
    fn test_parse_end() {
        assert!(parse_end("").is_ok());
        assert!(parse_end("// DEBUG").is_ok());
        assert!(parse_end("DEBUG").is_err());
    }
}
