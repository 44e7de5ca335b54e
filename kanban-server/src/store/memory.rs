//! In-memory [`PositionStore`].
//!
//! Rows live in hash maps behind a [`RwLock`]. A [`MemoryTransaction`]
//! stages its writes in a private overlay and publishes them in one step
//! on commit, so readers never observe a half-shifted column. When
//! uniqueness is enforced, every statement is checked against the
//! transaction's own view of the column, like an immediate (non-deferred)
//! unique index.
//!
//! Transactions are atomic but not serializable: two transactions touching
//! the same column can both commit. Callers that read-then-write must
//! serialize themselves (the engine holds per-column locks).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use kanban_proto::{BoardId, ColumnId, Position, RangeShift, Task, TaskId};
use parking_lot::{Mutex, RwLock};

use super::{
    BoardRecord, BoardRows, ColumnRecord, PositionStore, StoreError, StoreTransaction, TaskSlot,
};

#[derive(Debug, Default)]
struct Tables {
    boards: HashMap<BoardId, BoardRecord>,
    columns: HashMap<ColumnId, ColumnRecord>,
    tasks: HashMap<TaskId, Task>,
}

/// Failure injection switches, shared by the store and its transactions.
#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    /// Writes allowed before the next one fails; one-shot.
    write_budget: Mutex<Option<usize>>,
}

impl Faults {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }

    fn charge_write(&self) -> Result<(), StoreError> {
        self.check_available()?;
        let mut budget = self.write_budget.lock();
        match *budget {
            Some(0) => {
                *budget = None;
                Err(StoreError::Unavailable("injected write failure".into()))
            }
            Some(n) => {
                *budget = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Thread-safe in-memory store of boards, columns and tasks.
///
/// Cloning is cheap and yields a handle to the same tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
    unique_positions: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store that enforces unique `(column, position)`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_unique_positions(true)
    }

    /// Creates an empty store, choosing whether `(column, position)` is unique.
    #[must_use]
    pub fn with_unique_positions(unique_positions: bool) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            faults: Arc::new(Faults::default()),
            unique_positions,
        }
    }

    /// Simulates an outage: every `begin`, write and commit fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Lets `writes` more write statements succeed, then fails the next one.
    pub fn fail_after_writes(&self, writes: usize) {
        *self.faults.write_budget.lock() = Some(writes);
    }

    /// Number of committed task rows.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tables.read().tasks.len()
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    type Transaction = MemoryTransaction;

    fn enforces_unique_positions(&self) -> bool {
        self.unique_positions
    }

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        self.faults.check_available()?;
        Ok(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            faults: Arc::clone(&self.faults),
            unique_positions: self.unique_positions,
            staged: Staged::default(),
            state: TxState::Open,
        })
    }
}

/// Writes not yet visible to other transactions. `None` marks a deletion.
#[derive(Debug, Default)]
struct Staged {
    tasks: HashMap<TaskId, Option<Task>>,
    columns: HashMap<ColumnId, ColumnRecord>,
    boards: HashMap<BoardId, BoardRecord>,
}

impl Staged {
    fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.columns.is_empty() && self.boards.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Open,
    Aborted,
    Committed,
}

/// Transaction over a [`MemoryStore`]. Dropping it without committing
/// rolls back.
#[derive(Debug)]
pub struct MemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
    unique_positions: bool,
    staged: Staged,
    state: TxState,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        match self.state {
            TxState::Open => Ok(()),
            TxState::Aborted | TxState::Committed => Err(StoreError::TransactionClosed),
        }
    }

    /// Gate for every write statement: fails (and aborts) on injected faults.
    fn begin_write(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if let Err(e) = self.faults.charge_write() {
            self.state = TxState::Aborted;
            return Err(e);
        }
        Ok(())
    }

    fn abort(&mut self, error: StoreError) -> StoreError {
        self.state = TxState::Aborted;
        error
    }

    fn visible_task(&self, id: &TaskId) -> Option<Task> {
        if let Some(staged) = self.staged.tasks.get(id) {
            return staged.clone();
        }
        self.tables.read().tasks.get(id).cloned()
    }

    fn visible_column(&self, id: &ColumnId) -> Option<ColumnRecord> {
        if let Some(staged) = self.staged.columns.get(id) {
            return Some(staged.clone());
        }
        self.tables.read().columns.get(id).cloned()
    }

    fn visible_board(&self, id: &BoardId) -> Option<BoardRecord> {
        if let Some(staged) = self.staged.boards.get(id) {
            return Some(staged.clone());
        }
        self.tables.read().boards.get(id).cloned()
    }

    /// Tasks of a column ordered by `(position, id)`.
    fn visible_column_tasks(&self, column: &ColumnId) -> Vec<Task> {
        let tables = self.tables.read();
        self.column_tasks_in(&tables, column)
    }

    fn column_tasks_in(&self, tables: &Tables, column: &ColumnId) -> Vec<Task> {
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|t| &t.column_id == column && !self.staged.tasks.contains_key(&t.id))
            .cloned()
            .collect();
        tasks.extend(
            self.staged
                .tasks
                .values()
                .flatten()
                .filter(|t| &t.column_id == column)
                .cloned(),
        );
        tasks.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    fn visible_board_columns(&self, board: &BoardId) -> Vec<ColumnRecord> {
        let tables = self.tables.read();
        self.board_columns_in(&tables, board)
    }

    fn board_columns_in(&self, tables: &Tables, board: &BoardId) -> Vec<ColumnRecord> {
        let mut columns: Vec<ColumnRecord> = tables
            .columns
            .values()
            .filter(|c| &c.board_id == board && !self.staged.columns.contains_key(&c.id))
            .cloned()
            .collect();
        columns.extend(
            self.staged
                .columns
                .values()
                .filter(|c| &c.board_id == board)
                .cloned(),
        );
        columns.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        columns
    }

    /// Board, columns and tasks under one read guard. Commits publish under
    /// the write guard, so no commit can land halfway through.
    fn visible_board_rows(&self, board: &BoardId) -> Option<BoardRows> {
        let tables = self.tables.read();
        let record = match self.staged.boards.get(board) {
            Some(staged) => staged.clone(),
            None => tables.boards.get(board)?.clone(),
        };
        let columns = self
            .board_columns_in(&tables, board)
            .into_iter()
            .map(|column| {
                let tasks = self.column_tasks_in(&tables, &column.id);
                (column, tasks)
            })
            .collect();
        Some(BoardRows {
            board: record,
            columns,
        })
    }

    fn check_unique(&mut self, column: &ColumnId) -> Result<(), StoreError> {
        if !self.unique_positions {
            return Ok(());
        }
        let tasks = self.visible_column_tasks(column);
        if let Some(pair) = tasks.windows(2).find(|w| w[0].position == w[1].position) {
            let position = pair[0].position;
            return Err(self.abort(StoreError::UniqueViolation {
                column: column.clone(),
                position,
            }));
        }
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.state != TxState::Committed && !self.staged.is_empty() {
            tracing::debug!(
                staged_tasks = self.staged.tasks.len(),
                aborted = self.state == TxState::Aborted,
                "rolling back uncommitted transaction"
            );
        }
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_task(&mut self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        self.ensure_open()?;
        Ok(self.visible_task(id))
    }

    async fn tasks_by_column(
        &mut self,
        column: &ColumnId,
        exclude: Option<&TaskId>,
    ) -> Result<Vec<TaskSlot>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .visible_column_tasks(column)
            .into_iter()
            .filter(|t| exclude != Some(&t.id))
            .map(|t| TaskSlot {
                id: t.id,
                position: t.position,
            })
            .collect())
    }

    async fn column_tasks(&mut self, column: &ColumnId) -> Result<Vec<Task>, StoreError> {
        self.ensure_open()?;
        Ok(self.visible_column_tasks(column))
    }

    async fn max_task_position(
        &mut self,
        column: &ColumnId,
    ) -> Result<Option<Position>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .visible_column_tasks(column)
            .iter()
            .map(|t| t.position)
            .max())
    }

    async fn insert_task(&mut self, task: Task) -> Result<(), StoreError> {
        self.begin_write()?;
        if self.visible_task(&task.id).is_some() {
            return Err(self.abort(StoreError::DuplicateKey(format!("task {}", task.id))));
        }
        if self.visible_column(&task.column_id).is_none() {
            return Err(self.abort(StoreError::MissingRecord(format!(
                "column {}",
                task.column_id
            ))));
        }
        let column = task.column_id.clone();
        self.staged.tasks.insert(task.id.clone(), Some(task));
        self.check_unique(&column)
    }

    async fn update_task_position(
        &mut self,
        id: &TaskId,
        column: Option<&ColumnId>,
        position: Position,
    ) -> Result<(), StoreError> {
        self.begin_write()?;
        let Some(mut task) = self.visible_task(id) else {
            return Err(self.abort(StoreError::MissingRecord(format!("task {id}"))));
        };
        if let Some(column) = column {
            if self.visible_column(column).is_none() {
                return Err(self.abort(StoreError::MissingRecord(format!("column {column}"))));
            }
            task.column_id = column.clone();
        }
        task.position = position;
        let column = task.column_id.clone();
        self.staged.tasks.insert(id.clone(), Some(task));
        self.check_unique(&column)
    }

    async fn shift_positions(&mut self, shift: &RangeShift) -> Result<u64, StoreError> {
        self.begin_write()?;
        if shift.range.is_empty() {
            return Ok(0);
        }
        let delta = shift.delta.amount();
        let mut touched = 0u64;
        for mut task in self.visible_column_tasks(&shift.column) {
            if shift.range.contains(task.position) {
                task.position += delta;
                self.staged.tasks.insert(task.id.clone(), Some(task));
                touched += 1;
            }
        }
        self.check_unique(&shift.column)?;
        Ok(touched)
    }

    async fn delete_task(&mut self, id: &TaskId) -> Result<(), StoreError> {
        self.begin_write()?;
        if self.visible_task(id).is_none() {
            return Err(self.abort(StoreError::MissingRecord(format!("task {id}"))));
        }
        self.staged.tasks.insert(id.clone(), None);
        Ok(())
    }

    async fn find_column(&mut self, id: &ColumnId) -> Result<Option<ColumnRecord>, StoreError> {
        self.ensure_open()?;
        Ok(self.visible_column(id))
    }

    async fn columns_by_board(
        &mut self,
        board: &BoardId,
    ) -> Result<Vec<ColumnRecord>, StoreError> {
        self.ensure_open()?;
        Ok(self.visible_board_columns(board))
    }

    async fn max_column_position(
        &mut self,
        board: &BoardId,
    ) -> Result<Option<Position>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .visible_board_columns(board)
            .iter()
            .map(|c| c.position)
            .max())
    }

    async fn insert_column(&mut self, column: ColumnRecord) -> Result<(), StoreError> {
        self.begin_write()?;
        if self.visible_column(&column.id).is_some() {
            return Err(self.abort(StoreError::DuplicateKey(format!("column {}", column.id))));
        }
        if self.visible_board(&column.board_id).is_none() {
            return Err(self.abort(StoreError::MissingRecord(format!(
                "board {}",
                column.board_id
            ))));
        }
        self.staged.columns.insert(column.id.clone(), column);
        Ok(())
    }

    async fn find_board(&mut self, id: &BoardId) -> Result<Option<BoardRecord>, StoreError> {
        self.ensure_open()?;
        Ok(self.visible_board(id))
    }

    async fn board_rows(&mut self, board: &BoardId) -> Result<Option<BoardRows>, StoreError> {
        self.ensure_open()?;
        Ok(self.visible_board_rows(board))
    }

    async fn list_boards(&mut self) -> Result<Vec<BoardRecord>, StoreError> {
        self.ensure_open()?;
        let mut boards: Vec<BoardRecord> = {
            let tables = self.tables.read();
            tables
                .boards
                .values()
                .filter(|b| !self.staged.boards.contains_key(&b.id))
                .cloned()
                .collect()
        };
        boards.extend(self.staged.boards.values().cloned());
        boards.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(boards)
    }

    async fn insert_board(&mut self, board: BoardRecord) -> Result<(), StoreError> {
        self.begin_write()?;
        if self.visible_board(&board.id).is_some() {
            return Err(self.abort(StoreError::DuplicateKey(format!("board {}", board.id))));
        }
        self.staged.boards.insert(board.id.clone(), board);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if let Err(e) = self.faults.check_available() {
            return Err(self.abort(e));
        }
        let staged = std::mem::take(&mut self.staged);
        if !staged.is_empty() {
            let mut tables = self.tables.write();
            tables.boards.extend(staged.boards);
            tables.columns.extend(staged.columns);
            for (id, task) in staged.tasks {
                match task {
                    Some(task) => {
                        tables.tasks.insert(id, task);
                    }
                    None => {
                        tables.tasks.remove(&id);
                    }
                }
            }
        }
        self.state = TxState::Committed;
        Ok(())
    }
}
