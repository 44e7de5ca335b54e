//! Position arithmetic shared by the repositioning engine and the
//! prediction layer.
//!
//! A column's tasks always hold positions `0..n`. Moving a task is
//! expressed as a [`MovePlan`]: a clamped target index plus a small set of
//! range shifts that close the gap at the source and open a slot at the
//! destination. The engine executes the shifts as predicate-scoped batch
//! updates; the prediction layer reaches the same ordering with list
//! operations.

use serde::{Deserialize, Serialize};

use crate::ids::ColumnId;

/// Zero-based rank of a task within its column.
pub type Position = i64;

/// Inclusive range of positions; `end == None` means unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRange {
    /// Lowest position in the range.
    pub start: Position,
    /// Highest position in the range, if bounded.
    pub end: Option<Position>,
}

impl PositionRange {
    /// Range `[start, end]`.
    #[must_use]
    pub const fn between(start: Position, end: Position) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Range `[start, ∞)`.
    #[must_use]
    pub const fn from(start: Position) -> Self {
        Self { start, end: None }
    }

    /// Whether `position` falls inside the range.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        if position < self.start {
            return false;
        }
        match self.end {
            Some(end) => position <= end,
            None => true,
        }
    }

    /// Whether the range cannot contain any position.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self.end {
            Some(end) => end < self.start,
            None => false,
        }
    }
}

/// Direction of a range shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftDelta {
    /// Every position in the range moves down the list by one (`+1`).
    Increment,
    /// Every position in the range moves up the list by one (`-1`).
    Decrement,
}

impl ShiftDelta {
    /// Signed amount added to each position.
    #[must_use]
    pub const fn amount(self) -> Position {
        match self {
            Self::Increment => 1,
            Self::Decrement => -1,
        }
    }
}

/// One batch update: add `delta` to every task of `column` in `range`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeShift {
    /// Column whose tasks are shifted.
    pub column: ColumnId,
    /// Positions affected.
    pub range: PositionRange,
    /// Direction.
    pub delta: ShiftDelta,
}

/// The full set of position changes for one move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    /// Column the task is leaving.
    pub source: ColumnId,
    /// Position the task is leaving.
    pub old_position: Position,
    /// Column the task ends up in.
    pub destination: ColumnId,
    /// Final position of the task after clamping.
    pub target: Position,
    /// Shifts to apply to the other tasks, in order.
    pub shifts: Vec<RangeShift>,
}

impl MovePlan {
    /// Computes the plan for moving a task.
    ///
    /// `destination_len` is the number of tasks in the destination column
    /// *excluding* the moving task. The requested index is clamped to
    /// `[0, destination_len]`.
    #[must_use]
    pub fn compute(
        source: &ColumnId,
        old_position: Position,
        destination: &ColumnId,
        destination_len: usize,
        requested_index: i64,
    ) -> Self {
        let target = clamp_target_index(requested_index, destination_len);
        let mut shifts = Vec::with_capacity(2);

        if source == destination {
            if old_position < target {
                shifts.push(RangeShift {
                    column: source.clone(),
                    range: PositionRange::between(old_position + 1, target),
                    delta: ShiftDelta::Decrement,
                });
            } else if old_position > target {
                shifts.push(RangeShift {
                    column: source.clone(),
                    range: PositionRange::between(target, old_position - 1),
                    delta: ShiftDelta::Increment,
                });
            }
        } else {
            shifts.push(RangeShift {
                column: source.clone(),
                range: PositionRange::from(old_position + 1),
                delta: ShiftDelta::Decrement,
            });
            shifts.push(RangeShift {
                column: destination.clone(),
                range: PositionRange::from(target),
                delta: ShiftDelta::Increment,
            });
        }

        Self {
            source: source.clone(),
            old_position,
            destination: destination.clone(),
            target,
            shifts,
        }
    }

    /// Whether the task changes column.
    #[must_use]
    pub fn changes_column(&self) -> bool {
        self.source != self.destination
    }

    /// Whether the move leaves every position untouched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.changes_column() && self.old_position == self.target
    }

    /// Position another task in `column` at `position` holds after the move.
    ///
    /// Does not apply to the moving task itself.
    #[must_use]
    pub fn shifted_position(&self, column: &ColumnId, position: Position) -> Position {
        self.shifts
            .iter()
            .filter(|s| &s.column == column && s.range.contains(position))
            .fold(position, |p, s| p + s.delta.amount())
    }
}

/// Clamps a requested index into `[0, len]`.
#[must_use]
pub fn clamp_target_index(requested: i64, len: usize) -> Position {
    let upper = Position::try_from(len).unwrap_or(Position::MAX);
    requested.clamp(0, upper)
}

/// Whether the positions form exactly `0..n` (in any order).
#[must_use]
pub fn is_contiguous(positions: impl IntoIterator<Item = Position>) -> bool {
    let mut sorted: Vec<Position> = positions.into_iter().collect();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(index, &p)| Position::try_from(index).is_ok_and(|i| i == p))
}
