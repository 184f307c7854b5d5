//! Configuration error types

use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading a configuration file failed (malformed content or IO)
    #[error("Failed to load {path}: {cause}")]
    LoadFailure {
        path: PathBuf,
        #[source]
        cause: FailureCause,
    },

    /// Writing or deleting a configuration file failed
    #[error("Failed to save {path}: {cause}")]
    SaveFailure {
        path: PathBuf,
        #[source]
        cause: FailureCause,
    },

    /// One or more blocking validation errors
    #[error("Validation failed for '{id}': {}", errors.join("; "))]
    ValidationFailure { id: String, errors: Vec<String> },
}

/// Underlying cause of a load or save failure
#[derive(Error, Debug)]
pub enum FailureCause {
    /// File content could not be (de)serialized
    #[error("malformed data: {0}")]
    MalformedData(#[source] serde_json::Error),

    /// Filesystem operation failed
    #[error("IO failure: {0}")]
    Io(#[source] std::io::Error),

    /// A required argument was empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Coarse classification of a [`ConfigError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedData,
    IoFailure,
    InvalidArgument,
    Validation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MalformedData => write!(f, "malformed data"),
            ErrorKind::IoFailure => write!(f, "io failure"),
            ErrorKind::InvalidArgument => write!(f, "invalid argument"),
            ErrorKind::Validation => write!(f, "validation"),
        }
    }
}

impl FailureCause {
    fn kind(&self) -> ErrorKind {
        match self {
            FailureCause::MalformedData(_) => ErrorKind::MalformedData,
            FailureCause::Io(_) => ErrorKind::IoFailure,
            FailureCause::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }
}

impl ConfigError {
    /// Create a load failure caused by malformed content
    pub fn malformed(path: PathBuf, source: serde_json::Error) -> Self {
        ConfigError::LoadFailure {
            path,
            cause: FailureCause::MalformedData(source),
        }
    }

    /// Create a load failure caused by an IO error
    pub fn load_io(path: PathBuf, source: std::io::Error) -> Self {
        ConfigError::LoadFailure {
            path,
            cause: FailureCause::Io(source),
        }
    }

    /// Create a save failure caused by an IO error
    pub fn save_io(path: PathBuf, source: std::io::Error) -> Self {
        ConfigError::SaveFailure {
            path,
            cause: FailureCause::Io(source),
        }
    }

    /// Create a save failure caused by a serialization error
    pub fn save_serialize(path: PathBuf, source: serde_json::Error) -> Self {
        ConfigError::SaveFailure {
            path,
            cause: FailureCause::MalformedData(source),
        }
    }

    /// Reject a load before touching disk
    pub fn load_rejected(message: impl Into<String>) -> Self {
        ConfigError::LoadFailure {
            path: PathBuf::new(),
            cause: FailureCause::InvalidArgument(message.into()),
        }
    }

    /// Reject a save before touching disk
    pub fn save_rejected(message: impl Into<String>) -> Self {
        ConfigError::SaveFailure {
            path: PathBuf::new(),
            cause: FailureCause::InvalidArgument(message.into()),
        }
    }

    /// Create a validation failure
    pub fn validation(id: impl Into<String>, errors: Vec<String>) -> Self {
        ConfigError::ValidationFailure {
            id: id.into(),
            errors,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::LoadFailure { cause, .. } | ConfigError::SaveFailure { cause, .. } => {
                cause.kind()
            }
            ConfigError::ValidationFailure { .. } => ErrorKind::Validation,
        }
    }

    /// Whether this error came from the read side
    pub fn is_load_failure(&self) -> bool {
        matches!(self, ConfigError::LoadFailure { .. })
    }

    /// Whether this error came from the write side
    pub fn is_save_failure(&self) -> bool {
        matches!(self, ConfigError::SaveFailure { .. })
    }
}
