//! Position store abstraction.
//!
//! The repositioning engine is written against [`PositionStore`], an
//! ordered-record store with transactional batches. A transaction is
//! opened with [`PositionStore::begin`], mutated through
//! [`StoreTransaction`], and made durable with
//! [`StoreTransaction::commit`]. Dropping a transaction without committing
//! discards every staged write, which is also what happens when the
//! request future is cancelled mid-move.

pub mod memory;

use async_trait::async_trait;
use kanban_proto::{BoardId, BoardSummary, ColumnId, Position, RangeShift, Task, TaskId};
use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;

/// Stored board row.
pub type BoardRecord = BoardSummary;

/// Stored column row (tasks live in their own table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    /// Unique column identifier.
    pub id: ColumnId,
    /// Owning board.
    pub board_id: BoardId,
    /// Column heading.
    pub title: String,
    /// Hex color.
    pub color: String,
    /// Rank among the board's columns.
    pub position: Position,
}

/// Minimal `(id, position)` projection used by ordering queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSlot {
    /// Task identifier.
    pub id: TaskId,
    /// Current position.
    pub position: Position,
}

/// A board with its columns and each column's tasks, all read from one
/// committed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRows {
    /// The board row.
    pub board: BoardRecord,
    /// Columns ordered by position, each with its tasks ordered by position.
    pub columns: Vec<(ColumnRecord, Vec<Task>)>,
}

/// Errors reported by a position store.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// Two tasks of one column would share a position.
    #[error("unique constraint violated: column {column} already has a task at position {position}")]
    UniqueViolation {
        /// Column where the duplicate appeared.
        column: ColumnId,
        /// The duplicated position.
        position: Position,
    },
    /// A write referenced a row that does not exist.
    #[error("record not found: {0}")]
    MissingRecord(String),
    /// A row with the same key already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    /// A previous statement failed or the transaction was already committed.
    #[error("transaction closed")]
    TransactionClosed,
    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// An ordered-record store that hands out transactions.
#[async_trait]
pub trait PositionStore: Send + Sync + 'static {
    /// Transaction type produced by [`begin`](Self::begin).
    type Transaction: StoreTransaction;

    /// Whether `(column, position)` is enforced as unique on every statement.
    fn enforces_unique_positions(&self) -> bool;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Transaction, StoreError>;
}

/// Reads and writes performed inside one atomic transaction.
#[async_trait]
pub trait StoreTransaction: Send {
    // -- tasks --

    /// Reads one task.
    async fn find_task(&mut self, id: &TaskId) -> Result<Option<Task>, StoreError>;

    /// `(id, position)` of a column's tasks ordered by position, optionally
    /// leaving one task out.
    async fn tasks_by_column(
        &mut self,
        column: &ColumnId,
        exclude: Option<&TaskId>,
    ) -> Result<Vec<TaskSlot>, StoreError>;

    /// Full task rows of a column ordered by position.
    async fn column_tasks(&mut self, column: &ColumnId) -> Result<Vec<Task>, StoreError>;

    /// Highest position held in a column, `None` when empty.
    async fn max_task_position(&mut self, column: &ColumnId)
    -> Result<Option<Position>, StoreError>;

    /// Inserts a new task row.
    async fn insert_task(&mut self, task: Task) -> Result<(), StoreError>;

    /// Sets a task's position and, when given, its column.
    async fn update_task_position(
        &mut self,
        id: &TaskId,
        column: Option<&ColumnId>,
        position: Position,
    ) -> Result<(), StoreError>;

    /// Adds `shift.delta` to every task of `shift.column` whose position lies
    /// in `shift.range`, as one statement. Returns the number of rows touched.
    async fn shift_positions(&mut self, shift: &RangeShift) -> Result<u64, StoreError>;

    /// Deletes a task row.
    async fn delete_task(&mut self, id: &TaskId) -> Result<(), StoreError>;

    // -- columns --

    /// Reads one column.
    async fn find_column(&mut self, id: &ColumnId) -> Result<Option<ColumnRecord>, StoreError>;

    /// Columns of a board ordered by position.
    async fn columns_by_board(&mut self, board: &BoardId)
    -> Result<Vec<ColumnRecord>, StoreError>;

    /// Highest column position on a board, `None` when it has no columns.
    async fn max_column_position(&mut self, board: &BoardId)
    -> Result<Option<Position>, StoreError>;

    /// Inserts a new column row.
    async fn insert_column(&mut self, column: ColumnRecord) -> Result<(), StoreError>;

    // -- boards --

    /// Reads one board.
    async fn find_board(&mut self, id: &BoardId) -> Result<Option<BoardRecord>, StoreError>;

    /// Reads a board with every column and task as one consistent view: a
    /// commit is either wholly visible in the result or not at all.
    async fn board_rows(&mut self, board: &BoardId) -> Result<Option<BoardRows>, StoreError>;

    /// All boards, newest first.
    async fn list_boards(&mut self) -> Result<Vec<BoardRecord>, StoreError>;

    /// Inserts a new board row.
    async fn insert_board(&mut self, board: BoardRecord) -> Result<(), StoreError>;

    /// Makes every staged write visible atomically.
    async fn commit(&mut self) -> Result<(), StoreError>;
}
