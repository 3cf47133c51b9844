use std::fs;
use std::path::{Path, PathBuf};

use super::core::ReposcopeConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".reposcope.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse and validate config from a TOML string
pub fn parse_config(contents: &str) -> std::result::Result<ReposcopeConfig, String> {
    let config = toml::from_str::<ReposcopeConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))?;

    if let Some(walker) = &config.walker {
        for pattern in &walker.ignore_patterns {
            glob::Pattern::new(pattern)
                .map_err(|e| format!("Invalid ignore pattern '{}': {}", pattern, e))?;
        }
    }

    Ok(config)
}

/// Load an explicitly requested config file. Unlike discovery, a missing or
/// malformed explicit file is an error.
pub fn load_config_file(path: &Path) -> Result<ReposcopeConfig> {
    let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_config(&contents).map_err(|message| Error::Config {
        path: path.to_path_buf(),
        message,
    })
}

/// Try loading config from a specific path, logging parse failures
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<ReposcopeConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            tracing::warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        tracing::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Generate directory ancestors up to a depth limit, starting with `start`
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Discover `.reposcope.toml` in `start` or one of its ancestors.
pub fn discover_config(start: &Path) -> ReposcopeConfig {
    let start = start
        .canonicalize()
        .unwrap_or_else(|_| start.to_path_buf());

    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            tracing::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            ReposcopeConfig::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(indoc! {r#"
            [walker]
            exclude_dirs = ["vendor"]
            ignore_patterns = ["**/*.min.js"]

            [complexity]
            cyclomatic = 10

            [issues]
            stale_days = 30
        "#})
        .unwrap();

        assert_eq!(config.walker().exclude_dirs, vec!["vendor".to_string()]);
        assert!(config.walker().follow_symlinks);
        assert_eq!(config.complexity_thresholds().cyclomatic, 10);
        assert_eq!(config.issue_settings().stale_days, 30);
        assert_eq!(config.contributor_settings().leaderboard_size, 10);
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let err = parse_config("[walker]\nignore_patterns = [\"[\"]\n").unwrap_err();
        assert!(err.contains("Invalid ignore pattern"));
    }

    #[test]
    fn test_directory_ancestors_stops_at_depth() {
        let dirs: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a/b/c/d"), 3).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/c/d"),
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b")
            ]
        );
    }

    #[test]
    fn test_discover_config_in_parent_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[contributors]\nleaderboard_size = 3\n",
        )
        .unwrap();
        let nested = temp.path().join("packages").join("app");
        std::fs::create_dir_all(&nested).unwrap();

        let config = discover_config(&nested);
        assert_eq!(config.contributor_settings().leaderboard_size, 3);
    }

    #[test]
    fn test_malformed_discovered_config_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "[complexity\n").unwrap();

        let config = discover_config(temp.path());
        assert_eq!(config.complexity_thresholds(), Default::default());
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = load_config_file(&temp.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
