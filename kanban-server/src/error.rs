//! Error taxonomy of the engine and board services.

use kanban_proto::{BoardId, ColumnId, TaskId, ValidationError};

use crate::store::StoreError;

pub use kanban_proto::ErrorKind;

/// Errors surfaced by the repositioning engine and board services.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// Task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// Column does not exist.
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),
    /// Board does not exist.
    #[error("board not found: {0}")]
    BoardNotFound(BoardId),
    /// Conflicting concurrent change or uniqueness violation.
    #[error("position conflict in column {column}: {detail}")]
    Conflict {
        /// Column where the conflict was detected.
        column: ColumnId,
        /// Human-readable detail.
        detail: String,
    },
    /// Another request held the board lock for too long.
    #[error("board {0} is busy")]
    BoardBusy(BoardId),
    /// The store failed for reasons unrelated to the request.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl EngineError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::TaskNotFound(_) | Self::ColumnNotFound(_) | Self::BoardNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Conflict { .. } | Self::BoardBusy(_) => ErrorKind::Conflict,
            Self::StoreUnavailable(_) => ErrorKind::Unavailable,
        }
    }

    /// Whether repeating the whole request from fresh state may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Maps a store error raised while working on `column`.
    #[must_use]
    pub fn from_store(error: StoreError, column: &ColumnId) -> Self {
        Self::from_store_in(error, Some(column))
    }

    /// Maps a store error, charging conflicts to `column` when one is known.
    ///
    /// Without a column, failures that would be a conflict on it are
    /// reported as [`StoreUnavailable`](Self::StoreUnavailable).
    #[must_use]
    pub fn from_store_in(error: StoreError, column: Option<&ColumnId>) -> Self {
        match error {
            StoreError::UniqueViolation { column, position } => Self::Conflict {
                column,
                detail: format!("duplicate position {position}"),
            },
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            other @ (StoreError::MissingRecord(_)
            | StoreError::DuplicateKey(_)
            | StoreError::TransactionClosed) => match column {
                Some(column) => Self::Conflict {
                    column: column.clone(),
                    detail: other.to_string(),
                },
                None => Self::StoreUnavailable(other.to_string()),
            },
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EngineError>;
