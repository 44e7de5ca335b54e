//! Server-side task repositioning.
//!
//! A move is executed as one store transaction under the locks of every
//! column it touches:
//!
//! 1. Read the task and find its current column.
//! 2. Lock the source and destination columns (sorted order).
//! 3. Re-read the task inside the transaction. If it changed column while
//!    we were waiting, release everything and start over.
//! 4. Compute a [`MovePlan`] from the destination's committed length.
//! 5. Optionally park the task on [`SENTINEL_POSITION`], apply the range
//!    shifts, write the final `(column, position)` and commit.
//!
//! Any failure drops the transaction, which discards every staged write.

use std::sync::Arc;

use kanban_proto::{
    ColumnId, MoveOutcome, MovePlan, MoveRequest, PositionRange, RangeShift, ShiftDelta, Task,
    TaskId, ValidationError,
};
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, SentinelPolicy};
use crate::diagnostics::{ConflictHook, ConflictReport, ListingEntry, TracingConflictHook};
use crate::error::{EngineError, Result};
use crate::locks::{KeyGuard, KeyedLocks};
use crate::store::{PositionStore, StoreError, StoreTransaction};

/// Position a moving task is parked on while its neighbours shift.
///
/// Chosen so that no shift range ever contains it.
pub const SENTINEL_POSITION: kanban_proto::Position = kanban_proto::Position::MIN;

/// Moves, appends and deletes tasks while keeping every column's
/// positions contiguous.
pub struct RepositioningEngine<S: PositionStore> {
    pub(crate) store: Arc<S>,
    pub(crate) locks: KeyedLocks<ColumnId>,
    config: EngineConfig,
    hook: Arc<dyn ConflictHook>,
}

impl<S: PositionStore> RepositioningEngine<S> {
    /// Creates an engine with default settings and the logging conflict hook.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Creates an engine with explicit settings.
    #[must_use]
    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            config,
            hook: Arc::new(TracingConflictHook),
        }
    }

    /// Replaces the conflict diagnostics hook.
    #[must_use]
    pub fn with_conflict_hook(mut self, hook: Arc<dyn ConflictHook>) -> Self {
        self.hook = hook;
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn uses_sentinel(&self) -> bool {
        match self.config.sentinel {
            SentinelPolicy::Auto => self.store.enforces_unique_positions(),
            SentinelPolicy::Always => true,
            SentinelPolicy::Never => false,
        }
    }

    /// Moves a task to `target_index` of the destination column.
    ///
    /// The index is clamped to `[0, len]` where `len` is the destination's
    /// task count without the moving task. Moving a task onto its own
    /// position succeeds without writing anything.
    ///
    /// # Errors
    ///
    /// - [`EngineError::TaskNotFound`] / [`EngineError::ColumnNotFound`]
    ///   when either record is missing.
    /// - [`EngineError::Validation`] when the destination belongs to
    ///   another board.
    /// - [`EngineError::Conflict`] on a uniqueness violation or when the
    ///   column locks could not be obtained in time.
    /// - [`EngineError::StoreUnavailable`] when the store fails.
    ///
    /// On error nothing is committed.
    pub async fn move_task(&self, request: &MoveRequest) -> Result<MoveOutcome> {
        let destination = &request.destination_column_id;
        let locked = self.lock_task(&request.task_id, Some(destination)).await;
        let (guard, mut tx, task) = match locked {
            Ok(locked) => locked,
            Err(e) => {
                if let EngineError::Conflict { column, .. } = &e {
                    self.report_conflict(&request.task_id, column, &e).await;
                }
                warn!(task_id = %request.task_id, error = %e, "move could not lock its columns");
                return Err(e);
            }
        };

        let result = self.move_locked(&mut tx, &task, request).await;
        drop(tx);

        match result {
            Ok(outcome) => {
                if !outcome.is_noop() {
                    info!(
                        task_id = %outcome.task_id,
                        from = %outcome.source_column_id,
                        to = %outcome.destination_column_id,
                        position = outcome.position,
                        shifted = outcome.shifted,
                        "task moved"
                    );
                }
                Ok(outcome)
            }
            Err(e) => {
                if let EngineError::Conflict { column, .. } = &e {
                    self.report_conflict(&task.id, column, &e).await;
                }
                warn!(task_id = %task.id, error = %e, "move rolled back");
                drop(guard);
                Err(e)
            }
        }
    }

    /// Deletes a task and closes the gap it leaves behind.
    ///
    /// # Errors
    ///
    /// [`EngineError::TaskNotFound`] when the task does not exist, plus the
    /// store errors of [`move_task`](Self::move_task).
    pub async fn delete_task(&self, task_id: &TaskId) -> Result<Task> {
        let (_guard, mut tx, task) = self.lock_task(task_id, None).await?;
        let column = task.column_id.clone();
        let store_err = |e: StoreError| EngineError::from_store(e, &column);

        tx.delete_task(&task.id).await.map_err(store_err)?;
        let closed = tx
            .shift_positions(&RangeShift {
                column: column.clone(),
                range: PositionRange::from(task.position + 1),
                delta: ShiftDelta::Decrement,
            })
            .await
            .map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;

        info!(task_id = %task.id, column_id = %column, closed, "task deleted");
        Ok(task)
    }

    /// Waits for the locks on `keys`, giving up after the configured timeout.
    pub(crate) async fn lock_columns(
        &self,
        keys: &[&ColumnId],
        primary: &ColumnId,
    ) -> Result<KeyGuard<ColumnId>> {
        tokio::time::timeout(self.config.lock_timeout, self.locks.acquire(keys))
            .await
            .map_err(|_| {
                warn!(column_id = %primary, timeout = ?self.config.lock_timeout, "timed out waiting for column locks");
                EngineError::Conflict {
                    column: primary.clone(),
                    detail: "timed out waiting for column lock".to_string(),
                }
            })
    }

    /// Locks the task's current column (and `extra`), then re-reads the
    /// task inside a fresh transaction.
    async fn lock_task(
        &self,
        task_id: &TaskId,
        extra: Option<&ColumnId>,
    ) -> Result<(KeyGuard<ColumnId>, S::Transaction, Task)> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let seen = self.peek_task(task_id, extra).await?;

            let mut keys = vec![&seen.column_id];
            keys.extend(extra);
            let guard = self.lock_columns(&keys, &seen.column_id).await?;

            let mut tx = self
                .store
                .begin()
                .await
                .map_err(|e| EngineError::from_store(e, &seen.column_id))?;
            let task = tx
                .find_task(task_id)
                .await
                .map_err(|e| EngineError::from_store(e, &seen.column_id))?
                .ok_or_else(|| EngineError::TaskNotFound(task_id.clone()))?;

            if task.column_id == seen.column_id {
                return Ok((guard, tx, task));
            }

            debug!(%task_id, attempt, "task changed column while waiting for locks");
            if attempt >= self.config.max_lock_attempts {
                return Err(EngineError::Conflict {
                    column: task.column_id,
                    detail: format!("task kept changing column after {attempt} attempts"),
                });
            }
        }
    }

    /// Reads a task outside of any lock. `scope` is the column a conflict
    /// is charged to, when the caller already knows one.
    async fn peek_task(&self, task_id: &TaskId, scope: Option<&ColumnId>) -> Result<Task> {
        let store_err = |e: StoreError| EngineError::from_store_in(e, scope);
        let mut tx = self.store.begin().await.map_err(store_err)?;
        tx.find_task(task_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| EngineError::TaskNotFound(task_id.clone()))
    }

    async fn move_locked(
        &self,
        tx: &mut S::Transaction,
        task: &Task,
        request: &MoveRequest,
    ) -> Result<MoveOutcome> {
        let source = &task.column_id;
        let destination = &request.destination_column_id;
        let store_err = |e: StoreError| EngineError::from_store(e, destination);

        let destination_column = tx
            .find_column(destination)
            .await
            .map_err(store_err)?
            .ok_or_else(|| EngineError::ColumnNotFound(destination.clone()))?;

        if source != destination {
            let source_column = tx.find_column(source).await.map_err(store_err)?;
            if source_column.is_some_and(|c| c.board_id != destination_column.board_id) {
                return Err(ValidationError::CrossBoardMove.into());
            }
        }

        let destination_len = tx
            .tasks_by_column(destination, Some(&task.id))
            .await
            .map_err(store_err)?
            .len();
        let plan = MovePlan::compute(
            source,
            task.position,
            destination,
            destination_len,
            request.target_index,
        );

        let mut outcome = MoveOutcome {
            task_id: task.id.clone(),
            source_column_id: source.clone(),
            destination_column_id: destination.clone(),
            position: plan.target,
            shifted: 0,
        };
        if plan.is_noop() {
            debug!(task_id = %task.id, position = plan.target, "move is a no-op");
            return Ok(outcome);
        }

        debug!(
            task_id = %task.id,
            old_position = plan.old_position,
            target = plan.target,
            shifts = plan.shifts.len(),
            sentinel = self.uses_sentinel(),
            "applying move plan"
        );
        outcome.shifted = self
            .apply_plan(tx, &task.id, &plan)
            .await
            .map_err(store_err)?;
        tx.commit().await.map_err(store_err)?;
        Ok(outcome)
    }

    async fn apply_plan(
        &self,
        tx: &mut S::Transaction,
        task_id: &TaskId,
        plan: &MovePlan,
    ) -> std::result::Result<u64, StoreError> {
        if self.uses_sentinel() {
            tx.update_task_position(task_id, None, SENTINEL_POSITION)
                .await?;
        }
        let mut shifted = 0;
        for shift in &plan.shifts {
            shifted += tx.shift_positions(shift).await?;
        }
        let column = plan.changes_column().then_some(&plan.destination);
        tx.update_task_position(task_id, column, plan.target).await?;
        Ok(shifted)
    }

    /// Hands the committed listing of `column` to the conflict hook.
    ///
    /// Runs after rollback. The column locks are still held unless the
    /// conflict came from failing to take them.
    async fn report_conflict(&self, task_id: &TaskId, column: &ColumnId, error: &EngineError) {
        let listing = match self.store.begin().await {
            Ok(mut tx) => tx.column_tasks(column).await,
            Err(e) => Err(e),
        };
        match listing {
            Ok(tasks) => {
                let report = ConflictReport {
                    task_id: task_id.clone(),
                    column_id: column.clone(),
                    reason: error.to_string(),
                    listing: tasks
                        .into_iter()
                        .map(|t| ListingEntry {
                            id: t.id,
                            position: t.position,
                            title: t.title,
                        })
                        .collect(),
                };
                self.hook.on_conflict(&report);
            }
            Err(e) => warn!(column_id = %column, error = %e, "could not read column for conflict report"),
        }
    }
}
