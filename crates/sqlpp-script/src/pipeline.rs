//! Expander + assembler
//!
//! A [`ScriptPipeline`] is a reusable template. Every `compile_*` call builds
//! a fresh [`SourceExpander`] seeded with the pipeline's defines, so macros
//! from one script never leak into the next.

use std::io::BufRead;
use std::path::Path;

use sqlpp_core::Config;
use sqlpp_preprocess::{ExpandOptions, MacroError, MacroTable, PreprocessError, RawLine, SourceExpander};
use tracing::debug;

use crate::assembler::StatementAssembler;
use crate::statement::Statement;

#[derive(Debug, Clone, Default)]
pub struct ScriptPipeline {
    defines: MacroTable,
    options: ExpandOptions,
    assembler: StatementAssembler,
}

impl ScriptPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline using the config's defines, include limit and assembly settings
    pub fn from_config(config: &Config) -> Result<Self, MacroError> {
        let mut defines = MacroTable::new();
        for (name, value) in &config.defines {
            defines.set(name, value.clone())?;
        }

        Ok(Self {
            defines,
            options: ExpandOptions {
                max_include_depth: config.preprocess.max_include_depth,
            },
            assembler: StatementAssembler::new().split_on_file_change(config.assemble.split_on_file_change),
        })
    }

    pub fn with_defines(mut self, defines: MacroTable) -> Self {
        self.defines = defines;
        self
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_assembler(mut self, assembler: StatementAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn defines(&self) -> &MacroTable {
        &self.defines
    }

    pub fn defines_mut(&mut self) -> &mut MacroTable {
        &mut self.defines
    }

    pub fn assembler(&self) -> &StatementAssembler {
        &self.assembler
    }

    pub fn expand_file(&self, path: &Path) -> Result<Vec<RawLine>, PreprocessError> {
        self.expander().expand_file(path)
    }

    pub fn expand_str(&self, source: &str, name: &str) -> Result<Vec<RawLine>, PreprocessError> {
        self.expander().expand(source, name)
    }

    pub fn expand_reader<R: BufRead>(&self, reader: R, name: &str) -> Result<Vec<RawLine>, PreprocessError> {
        self.expander().expand_reader(reader, name)
    }

    pub fn compile_file(&self, path: &Path) -> Result<Vec<Statement>, PreprocessError> {
        let lines = self.expand_file(path)?;
        Ok(self.assemble(&path.display().to_string(), lines))
    }

    pub fn compile_str(&self, source: &str, name: &str) -> Result<Vec<Statement>, PreprocessError> {
        let lines = self.expand_str(source, name)?;
        Ok(self.assemble(name, lines))
    }

    pub fn compile_reader<R: BufRead>(&self, reader: R, name: &str) -> Result<Vec<Statement>, PreprocessError> {
        let lines = self.expand_reader(reader, name)?;
        Ok(self.assemble(name, lines))
    }

    fn expander(&self) -> SourceExpander {
        SourceExpander::with_macros(self.defines.clone()).with_options(self.options.clone())
    }

    fn assemble(&self, name: &str, lines: Vec<RawLine>) -> Vec<Statement> {
        let line_count = lines.len();
        let statements = self.assembler.assemble(lines);
        debug!(script = name, lines = line_count, statements = statements.len(), "compiled script");
        statements
    }
}
