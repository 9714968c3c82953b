//! Error types for h5tree_core.

use thiserror::Error;

/// Result type alias using h5tree_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while orchestrating the storage engine.
#[derive(Error, Debug)]
pub enum Error {
    /// No object exists at the given path.
    ///
    /// This is the expected outcome of existence checks and is never logged
    /// as an error.
    #[error("Object not found: {path}")]
    NotFound { path: String },

    /// The object exists but is neither a group nor a dataset.
    #[error("Unsupported object kind at {path}: {kind}")]
    UnsupportedKind { path: String, kind: String },

    /// The engine reported a handle kind this registry cannot close.
    #[error("Unknown kind for handle {handle}: {kind}")]
    UnknownHandleKind { handle: i64, kind: String },

    /// An engine primitive failed for reasons opaque to this layer.
    #[error("Engine failure in {operation}: {reason}")]
    EngineFailure { operation: String, reason: String },

    /// A container could not be closed because handles against it stayed
    /// open after the leak sweep. The container handle is still valid.
    #[error("Container {handle} still has {remaining} open handle(s)")]
    ContainerBusy { handle: i64, remaining: usize },

    /// A handle argument was the invalid sentinel or is not open.
    #[error("Invalid handle: {handle}")]
    InvalidHandle { handle: i64 },

    /// A path could not be used for the requested operation.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A mutation was attempted on a container opened read-only.
    #[error("Container is read-only: {path}")]
    ReadOnly { path: String },

    /// I/O error while reading or writing a snapshot.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Snapshot (de)serialization error.
    #[error("Snapshot error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound { path: path.into() }
    }

    /// Create an UnsupportedKind error.
    pub fn unsupported_kind(path: impl Into<String>, kind: impl Into<String>) -> Self {
        Error::UnsupportedKind {
            path: path.into(),
            kind: kind.into(),
        }
    }

    /// Create an UnknownHandleKind error.
    pub fn unknown_handle_kind(handle: i64, kind: impl Into<String>) -> Self {
        Error::UnknownHandleKind {
            handle,
            kind: kind.into(),
        }
    }

    /// Create an EngineFailure error.
    pub fn engine(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::EngineFailure {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a ContainerBusy error.
    pub fn container_busy(handle: i64, remaining: usize) -> Self {
        Error::ContainerBusy { handle, remaining }
    }

    /// Create an InvalidHandle error.
    pub fn invalid_handle(handle: i64) -> Self {
        Error::InvalidHandle { handle }
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a ReadOnly error.
    pub fn read_only(path: impl Into<String>) -> Self {
        Error::ReadOnly { path: path.into() }
    }

    /// True for the expected "nothing there" outcome of a probe.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}
