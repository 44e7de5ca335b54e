//! Shared board model and ordering rules for the kanban board.
//!
//! Both the server-side repositioning engine and the client-side
//! prediction layer depend on this crate so that they agree on ids,
//! snapshots, request shapes and, most importantly, on how a move request
//! maps to a final contiguous ordering.

pub mod api;
pub mod due;
pub mod ids;
pub mod model;
pub mod movement;
pub mod ordering;
pub mod validate;

pub use api::{ErrorBody, ErrorKind, MoveBody, NextPosition};
pub use ids::{BoardId, ColumnId, TaskId};
pub use model::{Board, BoardSummary, Column, NewBoard, NewColumn, NewTask, Priority, Task};
pub use movement::{MoveOutcome, MoveRequest};
pub use ordering::{MovePlan, Position, PositionRange, RangeShift, ShiftDelta};
pub use validate::ValidationError;
