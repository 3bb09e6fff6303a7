use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Strata error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Strata operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

/// Why a single file could not be turned into a model.
///
/// These never abort a directory scan; the analyzer collects them next to the
/// successful models so callers can report them in aggregate.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// Content is not valid UTF-8 text
    #[error("file is not valid UTF-8 text")]
    Decode,

    /// Content does not satisfy the language grammar (real-parse path only)
    #[error("syntax error at {line}:{column}: {detail}")]
    Parse {
        line: usize,
        column: usize,
        detail: String,
    },

    /// The file could not be read
    #[error("read failed: {message}")]
    Io { message: String },

    /// Not a file type any extractor handles
    #[error("unsupported file extension")]
    UnsupportedExtension,
}

impl FailureKind {
    /// Create a parse failure at a 1-based position
    pub fn parse(line: usize, column: usize, detail: impl Into<String>) -> Self {
        FailureKind::Parse {
            line,
            column,
            detail: detail.into(),
        }
    }

    /// Create a read failure
    pub fn io(message: impl Into<String>) -> Self {
        FailureKind::Io {
            message: message.into(),
        }
    }

    /// Short stable name used in aggregated reports
    pub fn name(&self) -> &'static str {
        match self {
            FailureKind::Decode => "decode",
            FailureKind::Parse { .. } => "parse",
            FailureKind::Io { .. } => "io",
            FailureKind::UnsupportedExtension => "unsupported_extension",
        }
    }

    /// Whether the failure should appear in a scan report
    pub fn is_reportable(&self) -> bool {
        !matches!(self, FailureKind::UnsupportedExtension)
    }
}

/// A per-file failure recorded during a scan
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}: {kind}", .path.display())]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_path_not_found_display() {
        let err = Error::PathNotFound(PathBuf::from("/some/path"));
        assert_eq!(err.to_string(), "Path not found: /some/path");
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::config_validation("chunk_size must be at least 1");
        assert_eq!(
            err.to_string(),
            "Config validation error: chunk_size must be at least 1"
        );
    }

    #[test]
    fn test_parser_error() {
        let err = Error::parser("language version mismatch");
        assert_eq!(err.to_string(), "Parser error: language version mismatch");
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }

    #[test]
    fn test_parse_failure_display() {
        let kind = FailureKind::parse(3, 7, "unexpected token");
        assert_eq!(kind.to_string(), "syntax error at 3:7: unexpected token");
        assert_eq!(kind.name(), "parse");
    }

    #[test]
    fn test_file_failure_display() {
        let failure = FileFailure::new("pkg/bad.py", FailureKind::Decode);
        assert_eq!(failure.to_string(), "pkg/bad.py: file is not valid UTF-8 text");
    }

    #[test]
    fn test_unsupported_extension_not_reportable() {
        assert!(!FailureKind::UnsupportedExtension.is_reportable());
        assert!(FailureKind::Decode.is_reportable());
        assert!(FailureKind::io("denied").is_reportable());
    }

    #[test]
    fn test_failure_kind_serializes_tagged() {
        let json = serde_json::to_string(&FailureKind::Decode).unwrap();
        assert_eq!(json, r#"{"kind":"decode"}"#);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
        assert_send_sync::<FileFailure>();
    }
}
