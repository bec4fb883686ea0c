//! Source expansion
//!
//! Reads a script line by line, applies directives and macro substitution,
//! and recurses into `#include`d scripts. The output is one [`RawLine`] per
//! emitted line, each tagged with the file and line it was read from.

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::conditional::ConditionalStack;
use crate::directive::{self, DirectiveKind, DirectiveLine};
use crate::error::PreprocessError;
use crate::macros::MacroTable;
use crate::origin::{RawLine, SourceOrigin};

/// Expansion limits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Maximum `#include` nesting; `None` leaves only cycle detection
    pub max_include_depth: Option<usize>,
}

/// Expands one script invocation.
///
/// The macro table lives as long as the expander, so defines made in an
/// included script stay visible to the including one. Conditional blocks are
/// tracked per script and must balance inside the script that opened them.
#[derive(Debug, Default)]
pub struct SourceExpander {
    macros: MacroTable,
    options: ExpandOptions,
    /// Canonical paths of the scripts currently being expanded
    include_chain: Vec<PathBuf>,
    include_depth: usize,
}

impl SourceExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from predefined macros
    pub fn with_macros(macros: MacroTable) -> Self {
        Self {
            macros,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut MacroTable {
        &mut self.macros
    }

    pub fn into_macros(self) -> MacroTable {
        self.macros
    }

    /// Expand in-memory script text attributed to `origin_file`
    pub fn expand(&mut self, source: &str, origin_file: &str) -> Result<Vec<RawLine>, PreprocessError> {
        let mut out = Vec::new();
        self.expand_lines(source.lines().map(|line| Ok(line.to_string())), origin_file, &mut out)?;
        Ok(out)
    }

    /// Expand a stream such as stdin
    pub fn expand_reader<R: BufRead>(&mut self, reader: R, origin_file: &str) -> Result<Vec<RawLine>, PreprocessError> {
        let mut out = Vec::new();
        self.expand_lines(reader.lines(), origin_file, &mut out)?;
        Ok(out)
    }

    /// Expand a script file
    pub fn expand_file(&mut self, path: &Path) -> Result<Vec<RawLine>, PreprocessError> {
        let mut out = Vec::new();
        self.expand_file_into(path, &mut out)?;
        Ok(out)
    }

    fn expand_file_into(&mut self, path: &Path, out: &mut Vec<RawLine>) -> Result<(), PreprocessError> {
        let name = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| PreprocessError::Io {
            path: name.clone(),
            source,
        })?;

        self.include_chain.push(canonical(path));
        let result = self.expand_lines(text.lines().map(|line| Ok(line.to_string())), &name, out);
        self.include_chain.pop();
        result
    }

    fn expand_lines<I>(&mut self, lines: I, file: &str, out: &mut Vec<RawLine>) -> Result<(), PreprocessError>
    where
        I: Iterator<Item = io::Result<String>>,
    {
        let mut conditionals = ConditionalStack::new();

        for (index, line) in lines.enumerate() {
            let line = line.map_err(|source| PreprocessError::Io {
                path: file.to_string(),
                source,
            })?;
            let number = index + 1;

            match directive::classify(&line) {
                Some(found) if found.kind.is_conditional() => {
                    self.apply_conditional(found, &mut conditionals, file, number)?;
                }
                Some(found) if conditionals.is_live() => match found.kind {
                    DirectiveKind::Include => self.include(found.args, file, number, out)?,
                    _ => self.define(found.args, file, number)?,
                },
                None if conditionals.is_live() => {
                    let text = self.macros.substitute(&line).into_owned();
                    out.push(RawLine::new(text, SourceOrigin::new(file, number)));
                }
                _ => trace!(file, line = number, "suppressed by conditional"),
            }
        }

        if let Some(frame) = conditionals.first_unclosed() {
            return Err(PreprocessError::UnclosedConditional {
                file: file.to_string(),
                line: frame.line,
                directive: frame.kind.keyword(),
                name: frame.name.clone(),
                open: conditionals.depth(),
            });
        }

        Ok(())
    }

    fn define(&mut self, args: &str, file: &str, line: usize) -> Result<(), PreprocessError> {
        let (name, raw_value) = directive::split_first_token(args);

        self.macros
            .define(name, raw_value)
            .map_err(|e| PreprocessError::DirectiveSyntax {
                file: file.to_string(),
                line,
                message: format!("invalid #define syntax: {}", e),
            })?;

        debug!(file, line, name, value = self.macros.lookup(name).unwrap_or_default(), "define");
        Ok(())
    }

    fn apply_conditional(
        &mut self,
        found: DirectiveLine<'_>,
        conditionals: &mut ConditionalStack,
        file: &str,
        line: usize,
    ) -> Result<(), PreprocessError> {
        let syntax = |message: String| PreprocessError::DirectiveSyntax {
            file: file.to_string(),
            line,
            message,
        };

        match found.kind {
            DirectiveKind::IfDef | DirectiveKind::IfNDef => {
                let name = directive::parse_conditional_name(found.kind, found.args).map_err(syntax)?;
                let frame = if found.kind == DirectiveKind::IfDef {
                    conditionals.open_if_defined(name, line, &self.macros)
                } else {
                    conditionals.open_if_not_defined(name, line, &self.macros)
                };
                debug!(file, line, directive = %found.kind, name, active = frame.active, "open conditional");
            }
            _ => {
                directive::parse_end(found.args).map_err(syntax)?;
                let frame = conditionals.close().map_err(|_| PreprocessError::UnmatchedEnd {
                    file: file.to_string(),
                    line,
                })?;
                debug!(file, line, opened_at = frame.line, name = %frame.name, "close conditional");
            }
        }

        Ok(())
    }

    fn include(&mut self, args: &str, file: &str, line: usize, out: &mut Vec<RawLine>) -> Result<(), PreprocessError> {
        let target = directive::parse_include(args).map_err(|message| PreprocessError::DirectiveSyntax {
            file: file.to_string(),
            line,
            message,
        })?;
        let resolved = resolve_include(file, target);

        if let Some(limit) = self.options.max_include_depth {
            if self.include_depth >= limit {
                return Err(PreprocessError::IncludeDepth {
                    file: file.to_string(),
                    line,
                    limit,
                });
            }
        }

        if self.include_chain.contains(&canonical(&resolved)) {
            return Err(PreprocessError::IncludeCycle {
                file: file.to_string(),
                line,
                target: resolved,
            });
        }

        debug!(file, line, target = %resolved.display(), "include");

        self.include_depth += 1;
        let result = self.expand_file_into(&resolved, out);
        self.include_depth -= 1;

        result.map_err(|source| PreprocessError::Include {
            file: file.to_string(),
            line,
            target: resolved,
            source: Box::new(source),
        })
    }
}

/// Resolve an include target against the directory of the including script
pub fn resolve_include(including_file: &str, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return target.to_path_buf();
    }

    match Path::new(including_file).parent() {
        Some(dir) => dir.join(target),
        None => target.to_path_buf(),
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
