//! Optimistic prediction of a move's outcome.
//!
//! [`predict`] applies a [`MoveRequest`] to a local [`Board`] snapshot with
//! plain list operations: take the task out of its column, insert it at the
//! clamped index of the destination, renumber both columns. For any request
//! the server accepts, the resulting order is the one the repositioning
//! engine commits.

use kanban_proto::ordering::clamp_target_index;
use kanban_proto::{Board, MoveRequest};

/// Returns the snapshot the board will have once `request` is committed.
///
/// Unknown tasks or destination columns leave the snapshot unchanged; the
/// server will reject such a request anyway.
#[must_use]
pub fn predict(board: &Board, request: &MoveRequest) -> Board {
    let mut next = board.clone();
    apply(&mut next, request);
    next
}

/// In-place variant of [`predict`]. Returns whether anything changed.
pub fn apply(board: &mut Board, request: &MoveRequest) -> bool {
    let Some((source, index)) = board.locate_task(&request.task_id) else {
        tracing::debug!(task_id = %request.task_id, "prediction skipped: task not in snapshot");
        return false;
    };
    let Some(destination) = board
        .columns
        .iter()
        .position(|c| c.id == request.destination_column_id)
    else {
        tracing::debug!(
            column_id = %request.destination_column_id,
            "prediction skipped: column not in snapshot"
        );
        return false;
    };

    let task = board.columns[source].tasks.remove(index);
    let column = &mut board.columns[destination];
    let target = clamp_target_index(request.target_index, column.tasks.len());
    let at = usize::try_from(target).unwrap_or(column.tasks.len());
    column.tasks.insert(at, task);

    board.columns[source].renumber();
    if destination != source {
        board.columns[destination].renumber();
    }
    source != destination || index != at
}
