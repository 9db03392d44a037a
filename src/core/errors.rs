//! Error types for extraction calls

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to the caller of a top-level extraction.
///
/// Failures inside import resolution never show up here; the resolver logs
/// them and under-populates its references instead.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The target file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    FileNotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target file is not valid source for its language
    #[error("Failed to parse {}: {message}", path.display())]
    ParseFailed { path: PathBuf, message: String },

    /// An explicitly requested declaration does not exist in the target file
    #[error("Object '{name}' not found in {}", path.display())]
    TargetNotFound { name: String, path: PathBuf },
}

impl ExtractionError {
    pub fn not_readable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileNotReadable {
            path: path.into(),
            source,
        }
    }

    pub fn parse_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn target_not_found(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::TargetNotFound {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, ExtractionError>;
