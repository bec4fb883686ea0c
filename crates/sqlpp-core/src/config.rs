//! Configuration schema (sqlpp.toml)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use crate::diagnostic::{Diagnostic, DiagnosticCode, Location};

/// Name of the configuration file looked up by [`Config::discover`]
pub const CONFIG_FILE_NAME: &str = "sqlpp.toml";

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "SQLPP_CONFIG";

/// Statement listing format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable listing
    Text,

    /// JSON documents
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Text
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("invalid output format '{}', must be one of: text, json", other)),
        }
    }
}

/// Preprocessor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Maximum `#include` nesting depth (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_include_depth: Option<usize>,

    /// File extensions picked up when processing a directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["sql".to_string()]
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_include_depth: None,
            extensions: default_extensions(),
        }
    }
}

/// Statement assembly settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembleConfig {
    /// End the current batch whenever the line stream crosses an include boundary
    #[serde(default = "default_true")]
    pub split_on_file_change: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            split_on_file_change: true,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Stop processing at the first failed statement or script
    #[serde(default)]
    pub end_on_error: bool,

    /// Statement listing format
    #[serde(default)]
    pub output: OutputFormat,

    /// Preprocessor settings
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    /// Statement assembly settings
    #[serde(default)]
    pub assemble: AssembleConfig,

    /// Macros seeded into every pipeline before the script is read
    #[serde(default)]
    pub defines: BTreeMap<String, String>,

    /// Directory the config was loaded from
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            end_on_error: false,
            output: OutputFormat::default(),
            preprocess: PreprocessConfig::default(),
            assemble: AssembleConfig::default(),
            defines: BTreeMap::new(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        config.validate()?;
        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Locate and load the configuration file.
    ///
    /// `$SQLPP_CONFIG` wins when set. Otherwise `sqlpp.toml` is searched in
    /// the current directory, the executable's directory and the home
    /// directory, in that order. Defaults are returned when nothing is found.
    pub fn discover() -> Result<Self, ConfigError> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&explicit));
        }
        Self::discover_in(&search_dirs())
    }

    /// Load the first `sqlpp.toml` found in `dirs`, or defaults
    pub fn discover_in(dirs: &[PathBuf]) -> Result<Self, ConfigError> {
        dirs.iter()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
            .map(|path| Self::from_file(&path))
            .unwrap_or_else(|| Ok(Self::default()))
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        for name in self.defines.keys() {
            if !is_identifier(name) {
                return Err(ConfigError::Invalid(format!(
                    "define name '{}' must be a single identifier",
                    name
                )));
            }
        }

        if self.preprocess.max_include_depth == Some(0) {
            return Err(ConfigError::Invalid(
                "preprocess.max_include_depth must be at least 1".to_string(),
            ));
        }

        if self.preprocess.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "preprocess.extensions must name at least one extension".to_string(),
            ));
        }

        Ok(())
    }
}

/// Check whether `path` carries one of `extensions`.
///
/// Extensions compare case-insensitively and may be written with a leading dot.
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };

    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Directories searched for `sqlpp.toml`, in order of preference
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    if let Some(home) = dirs::home_dir() {
        dirs.push(home);
    }

    dirs
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Convert to sqlpp diagnostic
    pub fn to_diagnostic(&self, path: Option<&Path>) -> Diagnostic {
        let diag = Diagnostic::error(DiagnosticCode::ConfigError, self.to_string());
        match path {
            Some(path) => diag.with_location(Location::new(path.display().to_string())),
            None => diag,
        }
    }
}
