//! Error types for the note store and board synchronization.

use crate::model::{NoteHandle, NoteId};
use thiserror::Error;

/// Errors raised by the note store, the synchronization layer and the CLI.
#[derive(Error, Debug)]
pub enum BoardError {
    /// The store cannot be opened or accessed.
    #[error("note store unavailable: {reason}")]
    Connection { reason: String },

    /// A CRUD operation was attempted before `open()` completed.
    #[error("note store is not open")]
    NotOpen,

    #[error("note not found: {id}")]
    NotFound { id: NoteId },

    /// The underlying database failed while writing.
    #[error("{op} failed: {source}")]
    Write {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The note has been rendered but its durable id is not bound yet.
    #[error("note {0} is not bound to a stored note yet")]
    Unbound(NoteHandle),

    #[error("no rendered note with handle {0}")]
    UnknownNote(NoteHandle),

    #[error("invalid position value: {0}")]
    InvalidPosition(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BoardError {
    pub(crate) fn connection(reason: impl std::fmt::Display) -> Self {
        Self::Connection {
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(op: &'static str, source: rusqlite::Error) -> Self {
        Self::Write { op, source }
    }

    /// Process exit code used by the CLI for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Connection { .. } | Self::NotOpen => 2,
            Self::NotFound { .. } | Self::UnknownNote(_) => 3,
            Self::Write { .. } => 4,
            Self::Unbound(_) | Self::InvalidPosition(_) | Self::Config(_) => 5,
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) => 1,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_missing_from_faults() {
        assert_eq!(BoardError::NotFound { id: NoteId(7) }.exit_code(), 3);
        assert_eq!(BoardError::NotOpen.exit_code(), 2);
        assert_eq!(
            BoardError::write("create", rusqlite::Error::InvalidQuery).exit_code(),
            4
        );
    }

    #[test]
    fn not_found_message_names_the_id() {
        let err = BoardError::NotFound { id: NoteId(42) };
        assert_eq!(err.to_string(), "note not found: 42");
    }
}
