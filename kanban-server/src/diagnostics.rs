//! Diagnostics hook for position conflicts.
//!
//! When a move fails with a uniqueness conflict the engine takes a fresh
//! snapshot of the offending column and hands it to a [`ConflictHook`]
//! before surfacing the error. The default hook writes it to the log.

use kanban_proto::{ColumnId, Position, TaskId};
use serde::Serialize;

/// One row of a column listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    /// Task identifier.
    pub id: TaskId,
    /// Committed position.
    pub position: Position,
    /// Task title.
    pub title: String,
}

/// Everything known about a conflict at the time it was reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    /// Task whose move failed.
    pub task_id: TaskId,
    /// Column where the conflict was detected.
    pub column_id: ColumnId,
    /// Error text reported by the store.
    pub reason: String,
    /// Committed contents of the column, ordered by position.
    pub listing: Vec<ListingEntry>,
}

/// Receiver of conflict reports.
pub trait ConflictHook: Send + Sync {
    /// Called once per conflicting move, after rollback.
    fn on_conflict(&self, report: &ConflictReport);
}

/// Logs conflict reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConflictHook;

impl ConflictHook for TracingConflictHook {
    fn on_conflict(&self, report: &ConflictReport) {
        tracing::error!(
            task_id = %report.task_id,
            column_id = %report.column_id,
            reason = %report.reason,
            tasks = report.listing.len(),
            "position conflict while moving task"
        );
        for entry in &report.listing {
            tracing::error!(
                column_id = %report.column_id,
                task_id = %entry.id,
                position = entry.position,
                title = %entry.title,
                "conflicting column listing"
            );
        }
    }
}
