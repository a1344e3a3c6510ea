//! Error types for the dump pipeline
//!
//! Every variant is fatal: the pipeline stops before the target file is
//! written.

use ldump_document::DocumentError;
use std::path::PathBuf;

/// Main dump error type
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// Upstream package is not installed (only raised under `MissingPackagePolicy::Fail`)
    #[error("the `{package}` package is not found/installed")]
    NotInstalled { package: String },

    /// Origin text could not be decoded, or its root is not a mapping
    #[error("malformed document {path}: {source}")]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    /// Required section is absent or has the wrong container type
    #[error("`{section}` expected to be a {expected}, got {actual}")]
    MissingOrMalformedSection {
        section: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A bootstrap file entry is not a string
    #[error("`{section}[{index}]` expected to be a string, got {actual}")]
    InvalidEntryType {
        section: String,
        index: usize,
        actual: &'static str,
    },

    /// Deny-listed services missing from the upstream document
    #[error("the following services are unknown: `{}`", .missing.join("`, `"))]
    DriftedDenyList { missing: Vec<String> },

    /// Document could not be encoded
    #[error("encode failed: {0}")]
    Encode(#[source] DocumentError),

    /// Package lookup failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Path computation failed
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// IO error on origin or target
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DumpError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create missing/malformed section error
    pub fn section(section: impl Into<String>, expected: &'static str, actual: &'static str) -> Self {
        Self::MissingOrMalformedSection {
            section: section.into(),
            expected,
            actual,
        }
    }
}

/// Errors while reading Composer metadata
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Metadata file exists but cannot be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata file is not valid JSON of the expected shape
    #[error("invalid metadata in {path}: {source}")]
    InvalidMetadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from lexical path computations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Input must be absolute
    #[error("path is not absolute: {0}")]
    NotAbsolute(PathBuf),

    /// No relative path exists between different roots (e.g. drives)
    #[error("no relative path from {from} to {to}")]
    DifferentRoots { from: PathBuf, to: PathBuf },

    /// Path is not valid UTF-8 and cannot be stored in the document
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8(PathBuf),
}

/// Result type alias for dump operations
pub type DumpResult<T> = Result<T, DumpError>;
