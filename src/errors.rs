use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in `regsweep`.
///
/// Per-file variants (`Unreadable`, `EngineFault`, `Write`) are caught by the
/// batch loop and turned into events; everything else surfaces to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// An error related to file system I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The user pattern could not be compiled. Fatal to the whole batch.
    #[error("{0}")]
    Pattern(#[from] regex::Error),

    /// The user pattern was empty.
    #[error("Please provide a regex pattern.")]
    EmptyPattern,

    /// A file could not be opened or decoded with any candidate encoding.
    #[error("Cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: ReadFailure },

    /// The pattern engine failed while applying a compiled pattern.
    #[error("Regex error: {0}")]
    EngineFault(String),

    /// A modified file could not be persisted.
    #[error("Cannot write {path}: {kind}")]
    Write { path: PathBuf, kind: WriteFailure },

    /// An encoding label that neither the built-in list nor `encoding_rs` knows.
    #[error("Unknown encoding '{0}'")]
    UnknownEncoding(String),

    /// An error that occurred while parsing a YAML configuration file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from the `ignore` crate, used for gitignore-aware traversal.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// An error from the `walkdir` crate.
    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// An error related to persisting a temporary file.
    #[error("Tempfile error: {0}")]
    TempFile(#[from] tempfile::PersistError),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a file was skipped before the engine ever saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    NotFound,
    PermissionDenied,
    Other(String),
    /// No candidate encoding decoded the whole file.
    Undecodable,
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFailure::NotFound => f.write_str("not found"),
            ReadFailure::PermissionDenied => f.write_str("permission denied"),
            ReadFailure::Other(msg) => f.write_str(msg),
            ReadFailure::Undecodable => f.write_str("no candidate encoding decodes the file"),
        }
    }
}

impl From<std::io::Error> for ReadFailure {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ReadFailure::NotFound,
            std::io::ErrorKind::PermissionDenied => ReadFailure::PermissionDenied,
            _ => ReadFailure::Other(err.to_string()),
        }
    }
}

/// Why a modified file could not be written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteFailure {
    PermissionDenied,
    /// The new text holds characters the file's encoding cannot represent.
    Unencodable { encoding: String },
    Other(String),
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteFailure::PermissionDenied => f.write_str("permission denied"),
            WriteFailure::Unencodable { encoding } => {
                write!(f, "text cannot be encoded as {encoding}")
            }
            WriteFailure::Other(msg) => f.write_str(msg),
        }
    }
}

impl From<std::io::Error> for WriteFailure {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => WriteFailure::PermissionDenied,
            _ => WriteFailure::Other(err.to_string()),
        }
    }
}

/// A convenient type alias for `Result<T, regsweep::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}
