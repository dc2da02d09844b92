//! Sequence load errors
//!
//! Everything here is fatal at load time. A failed load never installs a
//! partial generation; the scheduler or patcher keeps whatever it had before.
//! Missing callbacks at dispatch time are not errors and only produce a
//! `log::warn!` record.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading timelines, scene scripts and configuration
#[derive(Debug, Error)]
pub enum SequenceError {
    /// The source file could not be opened or read
    #[error("Unable to open sequence source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source is not valid JSON
    #[error("Malformed sequence document: {0}")]
    Json(#[from] serde_json::Error),

    /// A list field is absent or not an array
    #[error("'{0}' field must be an array")]
    NotAnArray(&'static str),

    /// A map field is not an object
    #[error("'{0}' field must be an object")]
    NotAnObject(&'static str),

    /// A required field is absent from an entry
    #[error("Missing '{field}' in {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    /// An event entry declares an unrecognized type
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// An event entry has a recognized type but an unusable payload
    #[error("Invalid event '{name}': {reason}")]
    InvalidEvent { name: String, reason: String },

    /// A scene patch entry has an unusable payload
    #[error("Invalid scene change #{index}: {reason}")]
    InvalidPatch { index: usize, reason: String },
}

impl SequenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_event(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEvent {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for sequence operations
pub type Result<T> = std::result::Result<T, SequenceError>;
