//! Crate-level error types.

use std::fmt;

use crate::buffer::BufferError;

/// Errors produced by the molstage crate.
#[derive(Debug)]
pub enum StageError {
    /// Loading a file failed (I/O, parse, or rejected extension).
    Load {
        /// Path or name the load was started with.
        path: String,
        /// Loader-provided reason.
        reason: String,
    },
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// The viewer backend rejected an operation.
    Viewer(String),
    /// A parameter patch could not be applied.
    Parameter(String),
    /// A buffer attribute update was rejected.
    Buffer(BufferError),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { path, reason } => {
                write!(f, "failed to load '{path}': {reason}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
            Self::Parameter(msg) => write!(f, "parameter error: {msg}"),
            Self::Buffer(e) => write!(f, "buffer error: {e}"),
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Buffer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<BufferError> for StageError {
    fn from(e: BufferError) -> Self {
        Self::Buffer(e)
    }
}

impl From<serde_json::Error> for StageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parameter(e.to_string())
    }
}
