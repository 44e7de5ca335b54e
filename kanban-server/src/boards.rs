//! Boards and their columns.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kanban_proto::model::DEFAULT_COLUMNS;
use kanban_proto::{Board, BoardId, BoardSummary, Column, ColumnId, NewBoard, NewColumn, Position};
use tracing::{info, warn};

use crate::error::{EngineError, Result};
use crate::locks::KeyedLocks;
use crate::store::{ColumnRecord, PositionStore, StoreError, StoreTransaction};

/// Creates and loads boards.
pub struct BoardDirectory<S: PositionStore> {
    store: Arc<S>,
    locks: KeyedLocks<BoardId>,
    lock_timeout: Duration,
}

fn store_err(e: StoreError) -> EngineError {
    match e {
        StoreError::Unavailable(reason) => EngineError::StoreUnavailable(reason),
        other => EngineError::StoreUnavailable(other.to_string()),
    }
}

fn column_snapshot(record: ColumnRecord) -> Column {
    Column {
        id: record.id,
        board_id: record.board_id,
        title: record.title,
        color: record.color,
        position: record.position,
        tasks: Vec::new(),
    }
}

impl<S: PositionStore> BoardDirectory<S> {
    /// Creates a directory over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, lock_timeout: Duration) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            lock_timeout,
        }
    }

    /// Creates a board together with the default "To Do", "In Progress"
    /// and "Done" columns.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for a bad title, or
    /// [`EngineError::StoreUnavailable`].
    pub async fn create_board(&self, new_board: NewBoard) -> Result<Board> {
        let new_board = new_board.validated()?;
        let summary = BoardSummary {
            id: BoardId::new(),
            title: new_board.title,
            description: new_board.description,
            created_at: Utc::now(),
        };
        let columns: Vec<ColumnRecord> = DEFAULT_COLUMNS
            .iter()
            .zip(0..)
            .map(|(&(title, color), position)| ColumnRecord {
                id: ColumnId::new(),
                board_id: summary.id.clone(),
                title: title.to_string(),
                color: color.to_string(),
                position,
            })
            .collect();

        let mut tx = self.store.begin().await.map_err(store_err)?;
        tx.insert_board(summary.clone()).await.map_err(store_err)?;
        for column in &columns {
            tx.insert_column(column.clone()).await.map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)?;

        info!(board_id = %summary.id, title = %summary.title, "board created");
        Ok(Board {
            id: summary.id,
            title: summary.title,
            description: summary.description,
            created_at: summary.created_at,
            columns: columns.into_iter().map(column_snapshot).collect(),
        })
    }

    /// Appends a column to the right of a board's existing columns.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`], [`EngineError::BoardNotFound`],
    /// [`EngineError::BoardBusy`] when the board lock times out, or
    /// [`EngineError::StoreUnavailable`].
    pub async fn create_column(&self, board_id: &BoardId, new_column: NewColumn) -> Result<Column> {
        new_column.validate()?;

        let _guard = tokio::time::timeout(self.lock_timeout, self.locks.acquire(&[board_id]))
            .await
            .map_err(|_| {
                warn!(%board_id, "timed out waiting for board lock");
                EngineError::BoardBusy(board_id.clone())
            })?;

        let mut tx = self.store.begin().await.map_err(store_err)?;
        if tx.find_board(board_id).await.map_err(store_err)?.is_none() {
            return Err(EngineError::BoardNotFound(board_id.clone()));
        }
        let position: Position = tx
            .max_column_position(board_id)
            .await
            .map_err(store_err)?
            .map_or(0, |p| p + 1);
        let record = ColumnRecord {
            id: ColumnId::new(),
            board_id: board_id.clone(),
            title: new_column.title,
            color: new_column.color,
            position,
        };
        tx.insert_column(record.clone()).await.map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;

        info!(%board_id, column_id = %record.id, position, "column created");
        Ok(column_snapshot(record))
    }

    /// All boards, newest first.
    ///
    /// # Errors
    ///
    /// [`EngineError::StoreUnavailable`].
    pub async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        let mut tx = self.store.begin().await.map_err(store_err)?;
        tx.list_boards().await.map_err(store_err)
    }

    /// Full snapshot of one board: columns and tasks in position order.
    ///
    /// Taken with one [`StoreTransaction::board_rows`] read, so a move that
    /// commits concurrently is either fully reflected or absent.
    ///
    /// # Errors
    ///
    /// [`EngineError::BoardNotFound`] or [`EngineError::StoreUnavailable`].
    pub async fn load_board(&self, board_id: &BoardId) -> Result<Board> {
        let mut tx = self.store.begin().await.map_err(store_err)?;
        let rows = tx
            .board_rows(board_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| EngineError::BoardNotFound(board_id.clone()))?;

        let columns = rows
            .columns
            .into_iter()
            .map(|(record, tasks)| {
                let mut column = column_snapshot(record);
                column.tasks = tasks;
                column
            })
            .collect();

        Ok(Board {
            id: rows.board.id,
            title: rows.board.title,
            description: rows.board.description,
            created_at: rows.board.created_at,
            columns,
        })
    }
}
