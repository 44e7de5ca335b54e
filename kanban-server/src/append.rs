//! Appending tasks to the end of a column.

use kanban_proto::{ColumnId, NewTask, Position, Task, TaskId};
use tracing::info;

use crate::engine::RepositioningEngine;
use crate::error::{EngineError, Result};
use crate::store::{PositionStore, StoreError, StoreTransaction};

impl<S: PositionStore> RepositioningEngine<S> {
    /// Position a task appended to `column_id` right now would receive.
    ///
    /// Informational only: a concurrent append may take it first.
    ///
    /// # Errors
    ///
    /// [`EngineError::ColumnNotFound`] or [`EngineError::StoreUnavailable`].
    pub async fn next_position(&self, column_id: &ColumnId) -> Result<Position> {
        let store_err = |e: StoreError| EngineError::from_store(e, column_id);
        let mut tx = self.store.begin().await.map_err(store_err)?;
        if tx.find_column(column_id).await.map_err(store_err)?.is_none() {
            return Err(EngineError::ColumnNotFound(column_id.clone()));
        }
        let max = tx.max_task_position(column_id).await.map_err(store_err)?;
        Ok(max.map_or(0, |p| p + 1))
    }

    /// Creates a task at the end of a column.
    ///
    /// Holds the same column lock as [`move_task`](Self::move_task), so an
    /// append never interleaves with a move into or out of that column.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for a bad title,
    /// [`EngineError::ColumnNotFound`] for an unknown column, and the
    /// store errors of [`move_task`](Self::move_task).
    pub async fn append_task(&self, column_id: &ColumnId, new_task: NewTask) -> Result<Task> {
        let new_task = new_task.validated()?;
        let store_err = |e: StoreError| EngineError::from_store(e, column_id);

        let _guard = self.lock_columns(&[column_id], column_id).await?;
        let mut tx = self.store.begin().await.map_err(store_err)?;
        if tx.find_column(column_id).await.map_err(store_err)?.is_none() {
            return Err(EngineError::ColumnNotFound(column_id.clone()));
        }
        let position = tx
            .max_task_position(column_id)
            .await
            .map_err(store_err)?
            .map_or(0, |p| p + 1);

        let task = Task {
            id: TaskId::new(),
            column_id: column_id.clone(),
            title: new_task.title,
            description: new_task.description,
            priority: new_task.priority,
            due_date: new_task.due_date,
            is_completed: false,
            position,
        };
        tx.insert_task(task.clone()).await.map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;

        info!(task_id = %task.id, column_id = %column_id, position, "task appended");
        Ok(task)
    }
}
