//! Layout errors

use thiserror::Error;
use void_sequence::{EventKind, SequenceError};

/// Errors from layout rendering, parsing and marker import
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Timeline row not found in layout block {0}")]
    MissingTimelineRow(usize),

    #[error("Frame offset not found in layout block {0}")]
    MissingFrameOffset(usize),

    #[error("Unknown event key '{key}' in layout block {block}")]
    UnknownKey { key: String, block: usize },

    #[error("Key '{key}' is a {expected} event in the legend but is marked as {found}")]
    KindMismatch {
        key: String,
        expected: EventKind,
        found: EventKind,
    },

    #[error("Key '{key}' is already bound to '{existing}', cannot bind it to '{name}'")]
    ConflictingKey {
        key: String,
        existing: String,
        name: String,
    },

    #[error("Invalid key '{0}': keys are lowercase ascii letters")]
    InvalidKey(String),

    #[error("Toggle '{0}' is opened but never closed")]
    UnclosedToggle(String),

    #[error("Toggle '{0}' is closed without being opened")]
    UnopenedToggle(String),

    #[error("Malformed legend at line {line}: {reason}")]
    MalformedLegend { line: usize, reason: String },

    #[error("Malformed marker at line {line}: {reason}")]
    MalformedMarker { line: usize, reason: String },

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Result alias for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
