//! Turning a finished drag gesture into a move request.

use kanban_proto::{Board, ColumnId, MoveRequest, Position, TaskId};

/// What the dragged card was released over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Empty area of a column.
    Column(ColumnId),
    /// Another task card.
    Task(TaskId),
}

fn index(i: usize) -> Position {
    Position::try_from(i).unwrap_or(Position::MAX)
}

/// Resolves a drop into the move request it stands for.
///
/// - Same column, dropped on the column: move to the end.
/// - Same column, dropped on a task: take that task's index, one less when
///   it sits below the dragged task (indices exclude the dragged task).
/// - Other column, dropped on the column: append.
/// - Other column, dropped on a task: insert in front of it.
///
/// Returns `None` when the drop would not change anything or refers to
/// something not on the board.
#[must_use]
pub fn resolve_drop(board: &Board, dragged: &TaskId, target: &DropTarget) -> Option<MoveRequest> {
    let (source_index, old_index) = board.locate_task(dragged)?;
    let source = &board.columns[source_index];

    let destination = match target {
        DropTarget::Column(id) => board.column(id)?,
        DropTarget::Task(id) => {
            let (column_index, _) = board.locate_task(id)?;
            &board.columns[column_index]
        }
    };
    let over_index = match target {
        DropTarget::Column(_) => None,
        DropTarget::Task(id) => destination.task_index(id),
    };

    let target_index = if source.id == destination.id {
        match over_index {
            Some(over) if over > old_index => index(over - 1),
            Some(over) => index(over),
            None => index(destination.tasks.len().saturating_sub(1)),
        }
    } else {
        over_index.map_or_else(|| index(destination.tasks.len()), index)
    };

    if source.id == destination.id && target_index == index(old_index) {
        return None;
    }
    Some(MoveRequest::new(
        dragged.clone(),
        destination.id.clone(),
        target_index,
    ))
}
