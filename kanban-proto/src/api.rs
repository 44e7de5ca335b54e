//! JSON shapes exchanged between the HTTP server and its clients.

use serde::{Deserialize, Serialize};

use crate::ids::{ColumnId, TaskId};
use crate::movement::MoveRequest;
use crate::ordering::Position;

/// Coarse error classification used for retry decisions and HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input; never retried.
    Validation,
    /// Referenced record does not exist; fatal for the request.
    NotFound,
    /// Uniqueness or serialization conflict; retry from fresh state.
    Conflict,
    /// Store or transport failure; caller decides.
    Unavailable,
}

impl ErrorKind {
    /// Whether repeating the request from fresh state may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Conflict | Self::Unavailable)
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Classification.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub error: String,
}

/// Body of `POST /tasks/{id}/move`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveBody {
    /// Column the task should end up in.
    pub destination_column_id: ColumnId,
    /// Desired index in that column.
    pub target_index: i64,
}

impl MoveBody {
    /// Combines the body with the task id taken from the path.
    #[must_use]
    pub fn into_request(self, task_id: TaskId) -> MoveRequest {
        MoveRequest::new(task_id, self.destination_column_id, self.target_index)
    }
}

impl From<&MoveRequest> for MoveBody {
    fn from(request: &MoveRequest) -> Self {
        Self {
            destination_column_id: request.destination_column_id.clone(),
            target_index: request.target_index,
        }
    }
}

/// Response of `GET /columns/{id}/next-position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextPosition {
    /// Position the next appended task would receive.
    pub position: Position,
}
