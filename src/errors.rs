//! Error types for reposcope operations.
//!
//! Only conditions that make a whole analysis impossible are errors: an
//! unreadable repository root, an unparsable JSON payload, a bad config
//! file, or an unregistered migration type. Everything recoverable is a
//! [`ParseWarning`](crate::core::ParseWarning) carried inside the result.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// File system errors on paths the analysis cannot proceed without
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON payload handed to a JSON-facing analyzer
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file errors
    #[error("configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Migration type with no registry entry
    #[error("unknown migration type '{requested}' (supported: {})", supported.join(", "))]
    UnknownMigrationType {
        requested: String,
        supported: Vec<String>,
    },

    /// Coverage report errors
    #[error("coverage error in {}: {message}", path.display())]
    Coverage { path: PathBuf, message: String },

    /// Invalid glob in the walker configuration
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_migration_lists_supported_types() {
        let err = Error::UnknownMigrationType {
            requested: "cobol-to-rust".into(),
            supported: vec!["vue2-to-vue3".into(), "react-class-to-hooks".into()],
        };
        assert_eq!(
            err.to_string(),
            "unknown migration type 'cobol-to-rust' (supported: vue2-to-vue3, react-class-to-hooks)"
        );
    }

    #[test]
    fn test_io_error_mentions_path() {
        let err = Error::io(
            "/missing/repo",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("/missing/repo"));
    }
}
