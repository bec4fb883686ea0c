//! Nested `#ifdef` / `#ifndef` / `#end` bookkeeping

use crate::macros::MacroTable;

/// Which conditional directive opened a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionalKind {
    IfDef,
    IfNDef,
}

impl ConditionalKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::IfDef => "#ifdef",
            Self::IfNDef => "#ifndef",
        }
    }
}

/// One open conditional block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalFrame {
    pub kind: ConditionalKind,

    /// Macro name the directive tested
    pub name: String,

    /// Line of the opening directive
    pub line: usize,

    /// Own truth value AND the activity of every enclosing frame
    pub active: bool,
}

/// `#end` was seen with no open block
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("#end without matching #ifdef or #ifndef")]
pub struct UnmatchedEnd;

/// Stack of open conditional blocks for one script
#[derive(Debug, Clone, Default)]
pub struct ConditionalStack {
    frames: Vec<ConditionalFrame>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an `#ifdef NAME` block
    pub fn open_if_defined(&mut self, name: &str, line: usize, macros: &MacroTable) -> &ConditionalFrame {
        let truth = macros.contains(name);
        self.push(ConditionalKind::IfDef, name, line, truth)
    }

    /// Open an `#ifndef NAME` block
    pub fn open_if_not_defined(&mut self, name: &str, line: usize, macros: &MacroTable) -> &ConditionalFrame {
        let truth = !macros.contains(name);
        self.push(ConditionalKind::IfNDef, name, line, truth)
    }

    /// Close the innermost block
    pub fn close(&mut self) -> Result<ConditionalFrame, UnmatchedEnd> {
        self.frames.pop().ok_or(UnmatchedEnd)
    }

    /// Whether lines at the current position should be emitted
    pub fn is_live(&self) -> bool {
        // each frame already folds in its parents
        self.frames.last().map_or(true, |frame| frame.active)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Outermost block still open, used to report unbalanced scripts
    pub fn first_unclosed(&self) -> Option<&ConditionalFrame> {
        self.frames.first()
    }

    pub fn frames(&self) -> &[ConditionalFrame] {
        &self.frames
    }

    fn push(&mut self, kind: ConditionalKind, name: &str, line: usize, truth: bool) -> &ConditionalFrame {
        let active = truth && self.is_live();
        self.frames.push(ConditionalFrame {
            kind,
            name: name.to_string(),
            line,
            active,
        });
        &self.frames[self.frames.len() - 1]
    }
}
