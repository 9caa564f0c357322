use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::data::SectionKind;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while indexing repositories or post-processing generated code.
#[derive(Error, Debug)]
pub enum Error {
    /// The repository root (or another path the caller depends on) could not be read.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single file or text blob could not be parsed. Always recovered locally.
    #[error("malformed content in {context}: {message}")]
    MalformedContent { context: String, message: String },

    /// A persisted index exists but cannot be used.
    #[error("stored index at {} is unusable: {message}", path.display())]
    StorageCorrupt { path: PathBuf, message: String },

    /// A generated section did not pass the syntax check.
    #[error("generated {section} section is not valid Python")]
    SyntaxInvalid { section: SectionKind },

    /// An include or exclude pattern is not a valid glob.
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl Error {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedContent {
            context: context.into(),
            message: message.into(),
        }
    }

    pub(crate) fn storage_corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::StorageCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failure modes of the text generation collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation timed out")]
    Timeout,

    #[error("transient generation failure: {0}")]
    Transient(String),

    #[error("generation failed: {0}")]
    Fatal(String),
}

impl GenerationError {
    /// Whether a caller-side retry policy may try the same prompt again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Timeout | GenerationError::Transient(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeout_and_transient_are_retryable() {
        assert!(GenerationError::Timeout.is_retryable());
        assert!(GenerationError::Transient("busy".into()).is_retryable());
        assert!(!GenerationError::Fatal("bad model".into()).is_retryable());
    }

    #[test]
    fn test_syntax_error_names_the_section() {
        let err = Error::SyntaxInvalid {
            section: SectionKind::Component,
        };
        assert_eq!(err.to_string(), "generated page object section is not valid Python");
    }
}
