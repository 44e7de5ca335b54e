//! HTTP client for the kanban server.
//!
//! [`BoardClient`] mirrors the server's JSON routes one method per
//! endpoint. Error responses are decoded from their `{ "kind", "error" }`
//! body so callers can tell a refused move from an unreachable server.

use kanban_proto::{
    Board, BoardId, BoardSummary, Column, ColumnId, ErrorBody, ErrorKind, MoveBody, MoveOutcome,
    MoveRequest, NewBoard, NewColumn, NewTask, NextPosition, Position, Task, TaskId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;

/// Errors returned by [`BoardClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response not read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// An endpoint URL could not be built.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with a structured error.
    #[error("server returned {status} ({kind:?}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error classification reported by the server.
        kind: ErrorKind,
        /// Server-provided message.
        message: String,
    },

    /// The server answered with an error that carries no structured body.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl ClientError {
    /// Classification of this error. Transport problems count as
    /// [`ErrorKind::Unavailable`].
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Server { kind, .. } => *kind,
            Self::Url(_) => ErrorKind::Validation,
            Self::Transport(_) | Self::UnexpectedStatus { .. } => ErrorKind::Unavailable,
        }
    }

    /// Whether the request may succeed if repeated from fresh state.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Typed client for the kanban HTTP API.
#[derive(Debug, Clone)]
pub struct BoardClient {
    http: reqwest::Client,
    base: Url,
}

impl BoardClient {
    /// Creates a client for the server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let mut base = config.server_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    /// Base URL every route is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /boards`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn list_boards(&self) -> Result<Vec<BoardSummary>, ClientError> {
        self.get("boards").await
    }

    /// `POST /boards`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn create_board(&self, new_board: &NewBoard) -> Result<Board, ClientError> {
        self.post("boards", new_board).await
    }

    /// `GET /boards/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn load_board(&self, board_id: &BoardId) -> Result<Board, ClientError> {
        self.get(&format!("boards/{board_id}")).await
    }

    /// `POST /boards/{id}/columns`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn create_column(
        &self,
        board_id: &BoardId,
        new_column: &NewColumn,
    ) -> Result<Column, ClientError> {
        self.post(&format!("boards/{board_id}/columns"), new_column)
            .await
    }

    /// `POST /columns/{id}/tasks`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn append_task(
        &self,
        column_id: &ColumnId,
        new_task: &NewTask,
    ) -> Result<Task, ClientError> {
        self.post(&format!("columns/{column_id}/tasks"), new_task)
            .await
    }

    /// `GET /columns/{id}/next-position`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn next_position(&self, column_id: &ColumnId) -> Result<Position, ClientError> {
        let next: NextPosition = self
            .get(&format!("columns/{column_id}/next-position"))
            .await?;
        Ok(next.position)
    }

    /// `POST /tasks/{id}/move`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn move_task(&self, request: &MoveRequest) -> Result<MoveOutcome, ClientError> {
        self.post(
            &format!("tasks/{}/move", request.task_id),
            &MoveBody::from(request),
        )
        .await
    }

    /// `DELETE /tasks/{id}`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure or an error response.
    pub async fn delete_task(&self, task_id: &TaskId) -> Result<Task, ClientError> {
        let url = self.base.join(&format!("tasks/{task_id}"))?;
        decode(self.http.delete(url).send().await?).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.base.join(path)?;
        tracing::debug!(%url, "GET");
        decode(self.http.get(url).send().await?).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.base.join(path)?;
        tracing::debug!(%url, "POST");
        decode(self.http.post(url).json(body).send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let text = response.text().await?;
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => Err(ClientError::Server {
            status: status.as_u16(),
            kind: body.kind,
            message: body.error,
        }),
        Err(_) => Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            body: text,
        }),
    }
}
