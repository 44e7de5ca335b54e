//! Board, column and task snapshots plus the payloads used to create them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BoardId, ColumnId, TaskId};
use crate::ordering::Position;
use crate::validate::{self, ValidationError};

/// Columns created together with every new board: `(title, color)`.
pub const DEFAULT_COLUMNS: [(&str, &str); 3] = [
    ("To Do", "#ef4444"),
    ("In Progress", "#f59e0b"),
    ("Done", "#10b981"),
];

/// Urgency of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Can wait.
    Low,
    /// The default for new tasks.
    #[default]
    Medium,
    /// Should be picked up soon.
    High,
    /// Needs attention now.
    Urgent,
}

impl Priority {
    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Urgent => write!(f, "URGENT"),
        }
    }
}

/// A task card as it appears in a board snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Column currently holding the task.
    pub column_id: ColumnId,
    /// Non-empty title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Urgency.
    #[serde(default)]
    pub priority: Priority,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Whether the task has been completed.
    #[serde(default)]
    pub is_completed: bool,
    /// Zero-based rank within the column.
    pub position: Position,
}

/// A column snapshot with its tasks in position order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Unique column identifier.
    pub id: ColumnId,
    /// Board this column belongs to.
    pub board_id: BoardId,
    /// Column heading.
    pub title: String,
    /// Hex color in `#RRGGBB` form.
    pub color: String,
    /// Zero-based rank among the board's columns.
    pub position: Position,
    /// Tasks ordered by position.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Column {
    /// Index of a task within this column's task list.
    #[must_use]
    pub fn task_index(&self, task_id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == task_id)
    }

    /// Rewrites every task's position to match its index in the list.
    pub fn renumber(&mut self) {
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.position = Position::try_from(index).unwrap_or(Position::MAX);
            task.column_id = self.id.clone();
        }
    }

    /// Task ids in list order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }
}

/// Full board snapshot: columns in position order, each with its tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Unique board identifier.
    pub id: BoardId,
    /// Board title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Columns ordered by position.
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Board {
    /// Looks up a column by id.
    #[must_use]
    pub fn column(&self, column_id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == column_id)
    }

    /// Returns `(column index, task index)` for the given task, if present.
    #[must_use]
    pub fn locate_task(&self, task_id: &TaskId) -> Option<(usize, usize)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(ci, column)| column.task_index(task_id).map(|ti| (ci, ti)))
    }

    /// Looks up a task anywhere on the board.
    #[must_use]
    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.locate_task(task_id)
            .map(|(ci, ti)| &self.columns[ci].tasks[ti])
    }

    /// Lightweight listing entry for this board.
    #[must_use]
    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
        }
    }
}

/// Board listing entry without columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    /// Unique board identifier.
    pub id: BoardId,
    /// Board title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBoard {
    /// Board title.
    pub title: String,
    /// Optional description; blank descriptions are stored as none.
    #[serde(default)]
    pub description: Option<String>,
}

impl NewBoard {
    /// Creates a payload with the given title and no description.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validates the payload and normalizes blank descriptions to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the title is empty or too long.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        validate::title(&self.title)?;
        self.description = validate::normalize_description(self.description);
        Ok(self)
    }
}

/// Payload for appending a column to a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewColumn {
    /// Column heading.
    pub title: String,
    /// Hex color in `#RRGGBB` form.
    pub color: String,
}

impl NewColumn {
    /// Creates a column payload.
    #[must_use]
    pub fn new(title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            color: color.into(),
        }
    }

    /// Validates title and color.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on an invalid title or color.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::title(&self.title)?;
        validate::hex_color(&self.color)
    }
}

/// Payload for appending a task to a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Task title.
    pub title: String,
    /// Optional description; blank descriptions are stored as none.
    #[serde(default)]
    pub description: Option<String>,
    /// Urgency, `MEDIUM` when omitted.
    #[serde(default)]
    pub priority: Priority,
    /// Optional due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    /// Creates a payload with default priority and no description.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Validates the payload and normalizes blank descriptions to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the title is empty or too long.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        validate::title(&self.title)?;
        self.description = validate::normalize_description(self.description);
        Ok(self)
    }
}
