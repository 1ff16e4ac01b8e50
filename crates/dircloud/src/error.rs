//! Error types for the dircloud library.
//!
//! Tree lookups never fail; these cover the operations that touch the
//! outside world: report files, directories, external tools and
//! catalogues.

use std::path::PathBuf;

/// Failure to build a tree from a report.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The backing report file cannot be opened or read.
    #[error("cannot read report {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was requested that is not among the configured reports.
    #[error("unknown report file: {0}")]
    UnknownSource(PathBuf),

    /// No report file was configured.
    #[error("no report file configured")]
    NoSource,
}

/// Failure to list a real directory.
#[derive(Debug, thiserror::Error)]
pub enum DiskError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] globset::Error),
}

/// Failure talking to a DICT server.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("not connected to a dict server")]
    NotConnected,

    #[error("dict server error {code}: {message}")]
    Server { code: u16, message: String },

    #[error("malformed dict response: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure resolving a leaf through the open-file fallback.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("unsupported fallback template: {0}")]
    Template(String),

    #[error(transparent)]
    Dict(#[from] DictError),

    #[error(transparent)]
    Sqlite(#[from] sqlx::Error),

    #[error("fallback lookup panicked: {0}")]
    Task(#[from] tokio::task::JoinError),
}
