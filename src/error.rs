//! Error types for the readlog library
//!
//! This module provides centralized error handling using `thiserror` across all components

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while opening the reading log itself
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// The reading log does not exist
    #[error("File not found! {}", path.display())]
    NotFound { path: PathBuf },

    /// The reading log path points at a directory
    #[error("The reading log must be a file, not a directory! {}", path.display())]
    IsDirectory { path: PathBuf },

    /// Any other I/O failure while reading lines
    #[error("Could not read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// Neither a feed nor a path was given
    #[error("No file given to load.")]
    NoInput,
}

impl ResourceError {
    /// Classify an I/O error raised while opening or reading `path`
    #[must_use]
    pub fn from_io(path: &Path, err: &std::io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::IsADirectory => Self::IsDirectory { path },
            _ => Self::Io {
                path,
                message: err.to_string(),
            },
        }
    }

    /// The path the error refers to, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path } | Self::IsDirectory { path } | Self::Io { path, .. } => {
                Some(path)
            }
            Self::NoInput => None,
        }
    }
}

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Configuration errors, raised before any line is parsed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent or empty
    #[error("Missing configuration: {0}")]
    Missing(String),

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Loading or merging the configuration sources failed
    #[error("Could not load configuration: {0}")]
    Load(String),
}

impl ConfigError {
    /// Create a missing key error
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing(key.into())
    }

    /// Create an invalid value error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    /// Create a load error
    pub fn load(reason: impl Into<String>) -> Self {
        Self::Load(reason.into())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => Self::Missing(key),
            other => Self::Load(other.to_string()),
        }
    }
}

impl From<regex::Error> for ConfigError {
    fn from(err: regex::Error) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A line describes an item that cannot exist as written
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidItemError {
    #[error("Only one ISBN/ASIN is allowed per item variant")]
    MultipleIsbns,

    #[error("Each Source must have only one URL")]
    MultipleUrls,

    #[error("Invalid URL, or each Source must have only one name")]
    InvalidSource,

    #[error("A title must not appear more than once in the list")]
    DuplicateTitle,

    #[error("Invalid planned item")]
    InvalidPlannedItem,

    #[error("Missing title")]
    MissingTitle,
}

/// Errors raised while parsing a single line
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// The line is well-formed but describes an invalid item
    #[error(transparent)]
    InvalidItem(#[from] InvalidItemError),

    /// Something in the line could not be interpreted at all
    #[error("Malformed line: {0}")]
    Malformed(String),

    /// Catch-all replacement for a malformed line
    #[error("{message}")]
    Generic { message: String },
}

impl ParseError {
    /// Create a malformed line error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }

    /// The generic error used in place of unclassified failures
    #[must_use]
    pub fn generic() -> Self {
        Self::Generic {
            message: "A line could not be parsed. Check this line".to_string(),
        }
    }

    /// Whether this error is always recoverable at the line boundary
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidItem(_) | Self::Generic { .. })
    }
}

/// Result type for line parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Main unified error type that can represent any readlog error
#[derive(Debug, Error)]
pub enum ReadlogError {
    /// Opening or reading the log failed
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A line failed and the failure was not recovered
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result type for readlog operations
pub type ReadlogResult<T> = Result<T, ReadlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_keeps_path() {
        let err = ResourceError::from_io(
            Path::new("/tmp/missing.csv"),
            &std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, ResourceError::NotFound { .. }));
        assert_eq!(err.path(), Some(Path::new("/tmp/missing.csv")));
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_resource_error_directory() {
        let err = ResourceError::from_io(
            Path::new("/tmp"),
            &std::io::Error::from(std::io::ErrorKind::IsADirectory),
        );
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_invalid_item_messages() {
        assert!(
            InvalidItemError::MultipleIsbns
                .to_string()
                .contains("one ISBN/ASIN")
        );
        assert!(
            InvalidItemError::DuplicateTitle
                .to_string()
                .contains("more than once")
        );
    }

    #[test]
    fn test_parse_error_from_invalid_item() {
        let err: ParseError = InvalidItemError::InvalidPlannedItem.into();
        assert!(err.is_recoverable());
        assert!(!ParseError::malformed("rating").is_recoverable());
        assert!(ParseError::generic().is_recoverable());
    }

    #[test]
    fn test_readlog_error_from_config_error() {
        let err: ReadlogError = ConfigError::missing("lines.dnf_string").into();
        assert!(err.to_string().contains("lines.dnf_string"));
    }
}
