//! Error types for remotejobs.
//!
//! Library crates use [`RemoteJobsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Candidates dropped for missing fields and rows skipped on a duplicate
//! `url` are not errors; they are counted outcomes of a refresh.

use std::path::PathBuf;

/// Top-level error type for all remotejobs operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteJobsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A source's listing page could not be fetched.
    #[error("fetch error ({source_name}): {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// A per-posting detail fetch failed. Caught inside the source that issued it.
    #[error("enrichment error at {url}: {message}")]
    Enrichment { url: String, message: String },

    /// HTML parsing or field extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (invalid URL, bad option value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A refresh running under the fail-fast policy was aborted by one source.
    #[error("refresh aborted: source {source_name} failed: {message}")]
    SourceFailed {
        source_name: String,
        message: String,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RemoteJobsError>;

impl RemoteJobsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch error attributed to a source.
    pub fn fetch(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            message: msg.into(),
        }
    }

    /// Create an enrichment error for a detail page URL.
    pub fn enrichment(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Enrichment {
            url: url.into(),
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
}
