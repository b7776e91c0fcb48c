//! Error type shared by the catalog store, loan ledger and lending service.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ItemId;

/// Errors that can occur while managing the library
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed row at {}:{line}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Item not available: {id}")]
    ItemUnavailable { id: ItemId },

    #[error("Invalid return request: {id}")]
    InvalidReturn { id: ItemId },

    #[error("Item not found: {id}")]
    ItemNotFound { id: ItemId },

    #[error("Item {id} is not an audiobook")]
    NotAudiobook { id: ItemId },

    #[error("Item id already in catalog: {id}")]
    DuplicateItem { id: ItemId },

    #[error("Item {id} is on loan and cannot be removed")]
    ItemOnLoan { id: ItemId },

    #[error("Invalid {field}: {value:?} (must not contain ',' or line breaks)")]
    InvalidField { field: &'static str, value: String },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// File-level failures go to the error log; the rest are user-facing
    pub fn is_file_failure(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Parse { .. })
    }
}
