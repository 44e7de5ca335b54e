//! One user's view of one board.
//!
//! [`BoardSession`] ties the pieces together: a drop is resolved to a move
//! request, the predicted board is shown immediately, the request is sent,
//! and the server's answer either confirms the prediction (with a freshly
//! loaded snapshot) or discards it.

use kanban_proto::{Board, BoardId, ColumnId, MoveOutcome, MoveRequest, NewTask, Task, TaskId};

use crate::drag::{DropTarget, resolve_drop};
use crate::net::{BoardClient, ClientError};
use crate::optimistic::OptimisticBoard;
use crate::predict;

/// Optimistic client-side session for a single board.
#[derive(Debug)]
pub struct BoardSession {
    client: BoardClient,
    board_id: BoardId,
    state: OptimisticBoard,
}

impl BoardSession {
    /// Loads the board and starts a session with nothing pending.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the board cannot be loaded.
    pub async fn open(client: BoardClient, board_id: BoardId) -> Result<Self, ClientError> {
        let board = client.load_board(&board_id).await?;
        tracing::info!(%board_id, columns = board.columns.len(), "board session opened");
        Ok(Self {
            client,
            board_id,
            state: OptimisticBoard::new(board),
        })
    }

    /// What should be rendered right now.
    #[must_use]
    pub fn view(&self) -> Board {
        self.state.view()
    }

    /// The last snapshot confirmed by the server.
    #[must_use]
    pub const fn confirmed(&self) -> &Board {
        self.state.confirmed()
    }

    /// Handles the end of a drag gesture.
    ///
    /// Returns `Ok(None)` when the drop does not move anything.
    ///
    /// # Errors
    ///
    /// Returns the server's or the transport's error after discarding the
    /// prediction.
    pub async fn drop_task(
        &mut self,
        dragged: &TaskId,
        target: &DropTarget,
    ) -> Result<Option<MoveOutcome>, ClientError> {
        let Some(request) = resolve_drop(&self.view(), dragged, target) else {
            return Ok(None);
        };
        self.move_task(request).await.map(Some)
    }

    /// Shows the predicted result of `request`, sends it, and reconciles.
    ///
    /// # Errors
    ///
    /// Returns the server's or the transport's error after discarding the
    /// prediction.
    pub async fn move_task(&mut self, request: MoveRequest) -> Result<MoveOutcome, ClientError> {
        let predicted = predict::predict(self.state.confirmed(), &request);
        let pending = self.state.push(request.clone());

        match self.client.move_task(&request).await {
            Ok(outcome) => {
                match self.client.load_board(&self.board_id).await {
                    Ok(board) => {
                        self.state.confirm(pending, board);
                    }
                    Err(e) => {
                        // The move is committed; the prediction is its result.
                        tracing::warn!(error = %e, "refresh after move failed, keeping prediction");
                        self.state.confirm(pending, predicted);
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %request.task_id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "move rejected, reverting prediction"
                );
                self.state.reject(pending);
                Err(e)
            }
        }
    }

    /// Appends a task to a column and refreshes the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the append or the refresh fails.
    pub async fn append_task(
        &mut self,
        column_id: &ColumnId,
        new_task: &NewTask,
    ) -> Result<Task, ClientError> {
        let task = self.client.append_task(column_id, new_task).await?;
        self.refresh().await?;
        Ok(task)
    }

    /// Reloads the confirmed snapshot from the server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the board cannot be loaded.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let board = self.client.load_board(&self.board_id).await?;
        self.state.refresh(board);
        Ok(())
    }
}
