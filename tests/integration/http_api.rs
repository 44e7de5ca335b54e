// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::future_not_send
)]

//! Integration tests for the HTTP surface: routes, status codes and the
//! `{ "kind", "error" }` error body.

use std::sync::Arc;

use kanban_server::api::{AppState, start_server, start_server_with_state};
use kanban_server::config::EngineConfig;
use kanban_server::store::MemoryStore;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct Api {
    http: reqwest::Client,
    base: String,
}

impl Api {
    async fn start() -> Self {
        let (addr, _handle) = start_server("127.0.0.1:0").await.unwrap();
        Self::at(addr)
    }

    fn at(addr: std::net::SocketAddr) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("http://{addr}"),
        }
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .http
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .http
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .http
            .delete(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();
        (response.status(), response.json().await.unwrap())
    }

    /// Creates a board and returns `(board_id, [column ids])`.
    async fn board(&self, title: &str) -> (String, Vec<String>) {
        let (status, board) = self.post("/boards", &json!({ "title": title })).await;
        assert_eq!(status, StatusCode::CREATED);
        let columns = board["columns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect();
        (board["id"].as_str().unwrap().to_string(), columns)
    }

    async fn append(&self, column: &str, title: &str) -> Value {
        let (status, task) = self
            .post(&format!("/columns/{column}/tasks"), &json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        task
    }

    async fn titles(&self, board: &str, column: usize) -> Vec<String> {
        let (status, board) = self.get(&format!("/boards/{board}")).await;
        assert_eq!(status, StatusCode::OK);
        board["columns"][column]["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect()
    }
}

fn assert_error(body: &Value, kind: &str) {
    assert_eq!(body["kind"], kind, "body: {body}");
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

// =============================================================================
// Boards and columns
// =============================================================================

#[tokio::test]
async fn create_and_list_boards() {
    let api = Api::start().await;

    let (status, board) = api
        .post(
            "/boards",
            &json!({ "title": "Release", "description": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(board["title"], "Release");
    assert!(board["description"].is_null());
    let columns: Vec<_> = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| (c["title"].as_str().unwrap(), c["position"].as_i64().unwrap()))
        .collect();
    assert_eq!(columns, [("To Do", 0), ("In Progress", 1), ("Done", 2)]);

    let (status, list) = api.get("/boards").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], board["id"]);
}

#[tokio::test]
async fn create_column_appends_after_existing() {
    let api = Api::start().await;
    let (board, _) = api.board("Ops").await;

    let (status, column) = api
        .post(
            &format!("/boards/{board}/columns"),
            &json!({ "title": "Blocked", "color": "#ef4444" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(column["position"], 3);
    assert_eq!(column["board_id"].as_str().unwrap(), board);
}

#[tokio::test]
async fn invalid_bodies_are_validation_errors() {
    let api = Api::start().await;
    let (board, columns) = api.board("Ops").await;

    let (status, body) = api.post("/boards", &json!({ "title": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation");

    let (status, body) = api
        .post(
            &format!("/boards/{board}/columns"),
            &json!({ "title": "Bad", "color": "red" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation");

    let (status, body) = api
        .post(&format!("/columns/{}/tasks", columns[0]), &json!({ "nope": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation");
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let api = Api::start().await;

    let (status, body) = api
        .get("/boards/00000000-0000-7000-8000-000000000000")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "not_found");

    let (status, body) = api.get("/boards/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation");

    let (status, body) = api.delete("/tasks/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation");
}

// =============================================================================
// Tasks
// =============================================================================

#[tokio::test]
async fn append_and_next_position() {
    let api = Api::start().await;
    let (_, columns) = api.board("Ops").await;

    let (_, next) = api
        .get(&format!("/columns/{}/next-position", columns[0]))
        .await;
    assert_eq!(next["position"], 0);

    let first = api.append(&columns[0], "a").await;
    let second = api.append(&columns[0], "b").await;
    assert_eq!(first["position"], 0);
    assert_eq!(second["position"], 1);
    assert_eq!(first["priority"], "MEDIUM");
    assert_eq!(first["is_completed"], false);

    let (_, next) = api
        .get(&format!("/columns/{}/next-position", columns[0]))
        .await;
    assert_eq!(next["position"], 2);
}

#[tokio::test]
async fn move_task_over_http() {
    let api = Api::start().await;
    let (board, columns) = api.board("Ops").await;
    let a = api.append(&columns[0], "a").await;
    api.append(&columns[0], "b").await;
    api.append(&columns[1], "c").await;

    let (status, outcome) = api
        .post(
            &format!("/tasks/{}/move", a["id"].as_str().unwrap()),
            &json!({ "destination_column_id": columns[1], "target_index": 1 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{outcome}");
    assert_eq!(outcome["source_column_id"].as_str().unwrap(), columns[0]);
    assert_eq!(outcome["destination_column_id"].as_str().unwrap(), columns[1]);
    assert_eq!(outcome["position"], 1);
    assert_eq!(api.titles(&board, 0).await, ["b"]);
    assert_eq!(api.titles(&board, 1).await, ["c", "a"]);
}

#[tokio::test]
async fn move_rejections() {
    let api = Api::start().await;
    let (board, columns) = api.board("Ops").await;
    let a = api.append(&columns[0], "a").await;
    let a_id = a["id"].as_str().unwrap();

    let (status, body) = api
        .post(
            &format!("/tasks/{a_id}/move"),
            &json!({ "destination_column_id": columns[0], "target_index": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "validation");

    let (status, body) = api
        .post(
            "/tasks/00000000-0000-7000-8000-000000000000/move",
            &json!({ "destination_column_id": columns[0], "target_index": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "not_found");

    let (status, body) = api
        .post(
            &format!("/tasks/{a_id}/move"),
            &json!({ "destination_column_id": "00000000-0000-7000-8000-000000000000", "target_index": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "not_found");

    assert_eq!(api.titles(&board, 0).await, ["a"]);
}

#[tokio::test]
async fn delete_task_closes_gap() {
    let api = Api::start().await;
    let (board, columns) = api.board("Ops").await;
    api.append(&columns[0], "a").await;
    let b = api.append(&columns[0], "b").await;
    api.append(&columns[0], "c").await;

    let (status, deleted) = api
        .delete(&format!("/tasks/{}", b["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["title"], "b");

    assert_eq!(api.titles(&board, 0).await, ["a", "c"]);
    let (_, next) = api
        .get(&format!("/columns/{}/next-position", columns[0]))
        .await;
    assert_eq!(next["position"], 2);

    let (status, body) = api
        .delete(&format!("/tasks/{}", b["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "not_found");
}

#[tokio::test]
async fn store_outage_is_503() {
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(Arc::clone(&store), EngineConfig::default()));
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", state)
        .await
        .unwrap();
    let api = Api::at(addr);
    let (_, columns) = api.board("Ops").await;

    store.set_unavailable(true);
    let (status, body) = api
        .post(&format!("/columns/{}/tasks", columns[0]), &json!({ "title": "x" }))
        .await;
    store.set_unavailable(false);

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_error(&body, "unavailable");
}
