//! Classpath resolution for reference classes
//!
//! Reference classes (platform stubs, runtime annotations, libraries) are
//! located with the following priority:
//! 1. `--classpath` command line argument (highest priority)
//! 2. `SENTO_CLASSPATH` environment variable
//! 3. `CLASSPATH` environment variable
//! 4. nothing (only the input classes are known)

use std::env;
use std::path::PathBuf;

use super::error::{Error, Result};

pub struct ClasspathResolver;

impl ClasspathResolver {
    /// Resolve the classpath string, empty when no source provides one
    pub fn resolve_classpath(classpath_arg: Option<&str>) -> String {
        if let Some(classpath) = classpath_arg {
            log::debug!("classpath: using --classpath argument: {}", classpath);
            return classpath.to_string();
        }

        for variable in ["SENTO_CLASSPATH", "CLASSPATH"] {
            if let Ok(value) = env::var(variable) {
                if !value.is_empty() {
                    log::debug!("classpath: using {} environment variable: {}", variable, value);
                    return value;
                }
            }
        }

        log::debug!("classpath: no reference classes configured");
        String::new()
    }

    /// Parse classpath string into individual entries
    /// Handles platform-specific path separators (: on Unix, ; on Windows)
    pub fn parse_classpath_entries(classpath: &str) -> Vec<String> {
        if classpath.is_empty() {
            return vec![];
        }

        let separator = if cfg!(windows) { ';' } else { ':' };
        classpath
            .split(separator)
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect()
    }

    /// Resolve and split in one step. A missing entry is an error; archives
    /// and other plain files are skipped since only class directories are read.
    pub fn resolve_directories(classpath_arg: Option<&str>) -> Result<Vec<PathBuf>> {
        let mut directories = Vec::new();
        for entry in Self::parse_classpath_entries(&Self::resolve_classpath(classpath_arg)) {
            let path = PathBuf::from(entry);
            if !path.exists() {
                return Err(Error::config_error(format!("classpath entry {} doesn't exist", path.display())));
            }
            if path.is_dir() {
                directories.push(path);
            } else {
                log::warn!("classpath: skipping {}, only directories are supported", path.display());
            }
        }
        Ok(directories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_priority() {
        let result = ClasspathResolver::resolve_classpath(Some("/path/classes"));
        assert_eq!(result, "/path/classes");
    }

    #[test]
    fn test_parse_classpath_entries() {
        let separator = if cfg!(windows) { ";" } else { ":" };
        let classpath = format!("/path1{}/path2{} {}/path3", separator, separator, separator);
        let entries = ClasspathResolver::parse_classpath_entries(&classpath);
        assert_eq!(entries, vec!["/path1", "/path2", "/path3"]);
    }

    #[test]
    fn test_empty_classpath() {
        assert!(ClasspathResolver::parse_classpath_entries("").is_empty());
    }

    #[test]
    fn test_missing_entry_is_an_error() {
        let error = ClasspathResolver::resolve_directories(Some("/definitely/not/here")).unwrap_err();
        assert_eq!(error.to_string(), "Configuration error: classpath entry /definitely/not/here doesn't exist");
    }

    #[test]
    fn test_plain_files_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let archive = root.path().join("android.jar");
        std::fs::write(&archive, b"").unwrap();
        let separator = if cfg!(windows) { ";" } else { ":" };
        let classpath = format!("{}{}{}", root.path().display(), separator, archive.display());
        let dirs = ClasspathResolver::resolve_directories(Some(&classpath)).unwrap();
        assert_eq!(dirs, vec![root.path().to_path_buf()]);
    }
}
