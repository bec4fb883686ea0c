//! Script discovery for directory runs

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlpp_core::matches_extension;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Cannot scan directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Cannot read modification time of {path}: {source}")]
    Metadata {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid date '{0}' (use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")]
    InvalidDate(String),
}

/// Parse a `--newer` cutoff. Times are taken as UTC.
pub fn parse_newer_than(text: &str) -> Result<DateTime<Utc>, DiscoveryError> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .map(|datetime| datetime.and_utc())
        .map_err(|_| DiscoveryError::InvalidDate(text.to_string()))
}

/// Find scripts under `dir` in file-name order.
///
/// A file qualifies when its extension matches one of `extensions`
/// (case-insensitive) and, if `newer_than` is given, it was not modified
/// before that instant.
pub fn find_scripts(
    dir: &Path,
    extensions: &[String],
    newer_than: Option<DateTime<Utc>>,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut scripts = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !matches_extension(path, extensions) {
            continue;
        }

        if let Some(cutoff) = newer_than {
            let modified = entry
                .metadata()
                .map_err(DiscoveryError::Walk)?
                .modified()
                .map_err(|source| DiscoveryError::Metadata {
                    path: path.display().to_string(),
                    source,
                })?;
            if DateTime::<Utc>::from(modified) < cutoff {
                tracing::debug!(path = %path.display(), "skipping script older than cutoff");
                continue;
            }
        }

        scripts.push(path.to_path_buf());
    }

    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::fs;

    fn sql() -> Vec<String> {
        vec!["sql".to_string()]
    }

    #[test]
    fn test_parse_newer_than() {
        let date = parse_newer_than("2023-01-01").unwrap();
        assert_eq!((date.year(), date.month(), date.day(), date.hour()), (2023, 1, 1, 0));

        let datetime = parse_newer_than("2023-06-15 13:45:10").unwrap();
        assert_eq!((datetime.hour(), datetime.minute(), datetime.second()), (13, 45, 10));

        assert!(matches!(parse_newer_than("yesterday"), Err(DiscoveryError::InvalidDate(_))));
        assert!(parse_newer_than("2023-13-01").is_err());
    }

    #[test]
    fn test_find_scripts_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.sql"), "SELECT 2;").unwrap();
        fs::write(dir.path().join("a.SQL"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("c.sqi"), "SELECT 3;").unwrap();
        fs::write(dir.path().join("notes.txt"), "not sql").unwrap();
        fs::write(dir.path().join("nested/d.sql"), "SELECT 4;").unwrap();

        let scripts = find_scripts(dir.path(), &sql(), None).unwrap();
        let names: Vec<_> = scripts
            .iter()
            .map(|path| path.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.SQL", "b.sql", "nested/d.sql"]);
    }

    #[test]
    fn test_find_scripts_extra_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.sql"), "").unwrap();
        fs::write(dir.path().join("b.sqi"), "").unwrap();

        let extensions = vec!["sql".to_string(), ".sqi".to_string()];
        assert_eq!(find_scripts(dir.path(), &extensions, None).unwrap().len(), 2);
    }

    #[test]
    fn test_find_scripts_newer_than() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fresh.sql"), "SELECT 1;").unwrap();

        let past = parse_newer_than("2000-01-01").unwrap();
        assert_eq!(find_scripts(dir.path(), &sql(), Some(past)).unwrap().len(), 1);

        let future = Utc::now() + chrono::Duration::days(1);
        assert!(find_scripts(dir.path(), &sql(), Some(future)).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_scripts(&dir.path().join("missing"), &sql(), None).unwrap_err();
        assert!(matches!(err, DiscoveryError::Walk(_)));
    }
}
