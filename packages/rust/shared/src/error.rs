//! Error types for slugpress.
//!
//! Library crates use [`SlugpressError`] via `thiserror`.
//! App crates (cli) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all slugpress operations.
#[derive(Debug, thiserror::Error)]
pub enum SlugpressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Stored data that does not decode (page ids, timestamps, counters).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty slug, duplicate slug in an import, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A record that was expected to exist does not.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SlugpressError>;

impl SlugpressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap any storage driver error.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SlugpressError::config("missing base_url");
        assert_eq!(err.to_string(), "config error: missing base_url");

        let err = SlugpressError::validation("slug must not be empty");
        assert!(err.to_string().contains("slug must not be empty"));

        let err = SlugpressError::storage("database is locked");
        assert_eq!(err.to_string(), "storage error: database is locked");
    }
}
