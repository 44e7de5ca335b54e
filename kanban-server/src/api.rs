//! HTTP surface: shared state, JSON handlers and server bootstrap.
//!
//! | Method   | Path                          | Body        | Response      |
//! |----------|-------------------------------|-------------|---------------|
//! | `GET`    | `/boards`                     |             | `[BoardSummary]` |
//! | `POST`   | `/boards`                     | `NewBoard`  | `Board` (201) |
//! | `GET`    | `/boards/{id}`                |             | `Board`       |
//! | `POST`   | `/boards/{id}/columns`        | `NewColumn` | `Column` (201)|
//! | `POST`   | `/columns/{id}/tasks`         | `NewTask`   | `Task` (201)  |
//! | `GET`    | `/columns/{id}/next-position` |             | `NextPosition`|
//! | `POST`   | `/tasks/{id}/move`            | `MoveBody`  | `MoveOutcome` |
//! | `DELETE` | `/tasks/{id}`                 |             | `Task`        |
//!
//! Failures are answered with an [`ErrorBody`] and a status derived from
//! its [`ErrorKind`].

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use kanban_proto::{
    Board, BoardId, BoardSummary, Column, ColumnId, ErrorBody, ErrorKind, MoveBody, MoveOutcome,
    NewBoard, NewColumn, NewTask, NextPosition, Task, TaskId, ValidationError,
};

use crate::boards::BoardDirectory;
use crate::config::EngineConfig;
use crate::engine::RepositioningEngine;
use crate::error::EngineError;
use crate::store::MemoryStore;

/// State shared by every request handler.
pub struct AppState {
    /// Task moves, appends and deletes.
    pub engine: RepositioningEngine<MemoryStore>,
    /// Board and column management.
    pub boards: BoardDirectory<MemoryStore>,
}

impl AppState {
    /// Builds both services over one store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>, config: EngineConfig) -> Self {
        let boards = BoardDirectory::new(Arc::clone(&store), config.lock_timeout);
        Self {
            engine: RepositioningEngine::with_config(store, config),
            boards,
        }
    }

    /// Uses a pre-built engine (e.g. one with a custom conflict hook).
    #[must_use]
    pub fn with_engine(engine: RepositioningEngine<MemoryStore>) -> Self {
        let boards = BoardDirectory::new(Arc::clone(engine.store()), engine.config().lock_timeout);
        Self { engine, boards }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()), EngineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed request, rendered as `{ "kind", "error" }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(kind: ErrorKind, error: String) -> Self {
        let status = match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            body: ErrorBody { kind, error },
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        EngineError::from(e).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(ErrorKind::Validation, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, error = %self.body.error, "request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.body.error, "request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn parse_id<T: FromStr>(raw: &str) -> ApiResult<T> {
    raw.parse()
        .map_err(|_| ValidationError::MalformedId(raw.to_string()).into())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_boards(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<BoardSummary>>> {
    Ok(Json(state.boards.list_boards().await?))
}

async fn create_board(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewBoard>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Board>)> {
    let Json(new_board) = body?;
    let board = state.boards.create_board(new_board).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

async fn load_board(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
) -> ApiResult<Json<Board>> {
    let board_id: BoardId = parse_id(&board_id)?;
    Ok(Json(state.boards.load_board(&board_id).await?))
}

async fn create_column(
    State(state): State<Arc<AppState>>,
    Path(board_id): Path<String>,
    body: Result<Json<NewColumn>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Column>)> {
    let board_id: BoardId = parse_id(&board_id)?;
    let Json(new_column) = body?;
    let column = state.boards.create_column(&board_id, new_column).await?;
    Ok((StatusCode::CREATED, Json(column)))
}

async fn append_task(
    State(state): State<Arc<AppState>>,
    Path(column_id): Path<String>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let column_id: ColumnId = parse_id(&column_id)?;
    let Json(new_task) = body?;
    let task = state.engine.append_task(&column_id, new_task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn next_position(
    State(state): State<Arc<AppState>>,
    Path(column_id): Path<String>,
) -> ApiResult<Json<NextPosition>> {
    let column_id: ColumnId = parse_id(&column_id)?;
    let position = state.engine.next_position(&column_id).await?;
    Ok(Json(NextPosition { position }))
}

async fn move_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    body: Result<Json<MoveBody>, JsonRejection>,
) -> ApiResult<Json<MoveOutcome>> {
    let task_id: TaskId = parse_id(&task_id)?;
    let Json(body) = body?;
    let request = body.into_request(task_id);
    request.validate()?;
    Ok(Json(state.engine.move_task(&request).await?))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task_id: TaskId = parse_id(&task_id)?;
    Ok(Json(state.engine.delete_task(&task_id).await?))
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

/// Builds the axum router over `state`.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route("/boards/{id}", get(load_board))
        .route("/boards/{id}/columns", post(create_column))
        .route("/columns/{id}/tasks", post(append_task))
        .route("/columns/{id}/next-position", get(next_position))
        .route("/tasks/{id}/move", post(move_task))
        .route("/tasks/{id}", axum::routing::delete(delete_task))
        .with_state(state)
}

/// Starts the server with an empty in-memory store and default settings.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(AppState::default())).await
}

/// Starts the server with a pre-configured [`AppState`].
///
/// Binding to port 0 lets the OS pick a port; the bound address is
/// returned together with the handle of the serving task.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<AppState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "kanban server error");
        }
    });

    Ok((bound_addr, handle))
}
