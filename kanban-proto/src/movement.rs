//! Move requests and their confirmed outcomes.

use serde::{Deserialize, Serialize};

use crate::ids::{ColumnId, TaskId};
use crate::ordering::Position;
use crate::validate::ValidationError;

/// Request to place a task at an index of a (possibly different) column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Task being moved.
    pub task_id: TaskId,
    /// Column the task should end up in.
    pub destination_column_id: ColumnId,
    /// Desired index in the destination column, clamped to its length.
    pub target_index: i64,
}

impl MoveRequest {
    /// Creates a move request.
    #[must_use]
    pub const fn new(task_id: TaskId, destination_column_id: ColumnId, target_index: i64) -> Self {
        Self {
            task_id,
            destination_column_id,
            target_index,
        }
    }

    /// Rejects negative target indices.
    ///
    /// The engine clamps regardless; this check belongs to request
    /// boundaries that should report the mistake to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NegativeIndex`].
    pub const fn validate(&self) -> Result<(), ValidationError> {
        if self.target_index < 0 {
            return Err(ValidationError::NegativeIndex(self.target_index));
        }
        Ok(())
    }
}

/// What a committed move did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Task that was moved.
    pub task_id: TaskId,
    /// Column the task left.
    pub source_column_id: ColumnId,
    /// Column the task now lives in.
    pub destination_column_id: ColumnId,
    /// Final position after clamping.
    pub position: Position,
    /// Number of other tasks whose position changed.
    pub shifted: u64,
}

impl MoveOutcome {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.source_column_id == self.destination_column_id && self.shifted == 0
    }
}
