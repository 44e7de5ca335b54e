// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::future_not_send
)]

//! Integration tests for the repositioning engine: moves, appends and
//! deletes against the in-memory store, including failure paths.

use std::sync::Arc;

use kanban_proto::ordering::is_contiguous;
use kanban_proto::{Board, BoardId, ColumnId, MoveRequest, NewBoard, NewTask, TaskId};
use kanban_server::boards::BoardDirectory;
use kanban_server::config::{EngineConfig, SentinelPolicy};
use kanban_server::diagnostics::{ConflictHook, ConflictReport};
use kanban_server::store::MemoryStore;
use kanban_server::{EngineError, ErrorKind, RepositioningEngine};
use parking_lot::Mutex;

struct Harness {
    store: Arc<MemoryStore>,
    engine: RepositioningEngine<MemoryStore>,
    boards: BoardDirectory<MemoryStore>,
    board: BoardId,
    x: ColumnId,
    y: ColumnId,
}

impl Harness {
    async fn new() -> Self {
        Self::with_engine(RepositioningEngine::new).await
    }

    async fn with_engine(
        build: impl FnOnce(Arc<MemoryStore>) -> RepositioningEngine<MemoryStore>,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let engine = build(Arc::clone(&store));
        let boards = BoardDirectory::new(Arc::clone(&store), engine.config().lock_timeout);
        let board = boards.create_board(NewBoard::new("Sprint")).await.unwrap();
        Self {
            x: board.columns[0].id.clone(),
            y: board.columns[1].id.clone(),
            board: board.id,
            store,
            engine,
            boards,
        }
    }

    async fn fill(&self, column: &ColumnId, titles: &[&str]) -> Vec<TaskId> {
        let mut ids = Vec::new();
        for title in titles {
            let task = self
                .engine
                .append_task(column, NewTask::new(*title))
                .await
                .unwrap();
            ids.push(task.id);
        }
        ids
    }

    async fn snapshot(&self) -> Board {
        self.boards.load_board(&self.board).await.unwrap()
    }

    async fn order(&self, column: &ColumnId) -> Vec<String> {
        let board = self.snapshot().await;
        let column = board.column(column).unwrap();
        assert!(
            is_contiguous(column.tasks.iter().map(|t| t.position)),
            "positions not contiguous: {:?}",
            column.tasks
        );
        column.tasks.iter().map(|t| t.title.clone()).collect()
    }
}

// =============================================================================
// Reordering
// =============================================================================

#[tokio::test]
async fn move_within_column_to_front() {
    let h = Harness::new().await;
    let ids = h.fill(&h.x, &["t0", "t1", "t2", "t3"]).await;

    let outcome = h
        .engine
        .move_task(&MoveRequest::new(ids[2].clone(), h.x.clone(), 0))
        .await
        .unwrap();

    assert_eq!(outcome.position, 0);
    assert_eq!(outcome.shifted, 2);
    assert_eq!(h.order(&h.x).await, ["t2", "t0", "t1", "t3"]);
}

#[tokio::test]
async fn move_to_other_column() {
    let h = Harness::new().await;
    let xs = h.fill(&h.x, &["t0", "t1"]).await;
    h.fill(&h.y, &["t2"]).await;

    let outcome = h
        .engine
        .move_task(&MoveRequest::new(xs[0].clone(), h.y.clone(), 1))
        .await
        .unwrap();

    assert_eq!(outcome.source_column_id, h.x);
    assert_eq!(outcome.destination_column_id, h.y);
    assert_eq!(h.order(&h.x).await, ["t1"]);
    assert_eq!(h.order(&h.y).await, ["t2", "t0"]);
}

#[tokio::test]
async fn move_into_empty_column() {
    let h = Harness::new().await;
    let xs = h.fill(&h.x, &["a", "b"]).await;

    h.engine
        .move_task(&MoveRequest::new(xs[1].clone(), h.y.clone(), 5))
        .await
        .unwrap();

    assert_eq!(h.order(&h.x).await, ["a"]);
    assert_eq!(h.order(&h.y).await, ["b"]);
}

#[tokio::test]
async fn unknown_task_changes_nothing() {
    let h = Harness::new().await;
    h.fill(&h.x, &["a", "b"]).await;
    let before = h.snapshot().await;

    let err = h
        .engine
        .move_task(&MoveRequest::new(TaskId::new(), h.x.clone(), 0))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::TaskNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!err.is_retryable());
    assert_eq!(h.snapshot().await, before);
}

#[tokio::test]
async fn moving_onto_own_position_is_a_noop() {
    let h = Harness::new().await;
    let ids = h.fill(&h.x, &["a", "b", "c"]).await;
    let before = h.snapshot().await;

    let outcome = h
        .engine
        .move_task(&MoveRequest::new(ids[1].clone(), h.x.clone(), 1))
        .await
        .unwrap();

    assert!(outcome.is_noop());
    assert_eq!(h.snapshot().await, before);
}

#[tokio::test]
async fn round_trip_restores_both_columns() {
    let h = Harness::new().await;
    let xs = h.fill(&h.x, &["a", "b", "c", "d"]).await;
    h.fill(&h.y, &["e", "f"]).await;
    let before = h.snapshot().await;

    h.engine
        .move_task(&MoveRequest::new(xs[2].clone(), h.y.clone(), 0))
        .await
        .unwrap();
    assert_eq!(h.order(&h.y).await, ["c", "e", "f"]);

    h.engine
        .move_task(&MoveRequest::new(xs[2].clone(), h.x.clone(), 2))
        .await
        .unwrap();

    assert_eq!(h.snapshot().await, before);
}

#[tokio::test]
async fn negative_index_is_clamped_to_front() {
    let h = Harness::new().await;
    let ids = h.fill(&h.x, &["a", "b", "c"]).await;

    let outcome = h
        .engine
        .move_task(&MoveRequest::new(ids[2].clone(), h.x.clone(), -3))
        .await
        .unwrap();

    assert_eq!(outcome.position, 0);
    assert_eq!(h.order(&h.x).await, ["c", "a", "b"]);
}

#[tokio::test]
async fn move_to_column_on_other_board_rejected() {
    let h = Harness::new().await;
    let ids = h.fill(&h.x, &["a"]).await;
    let other = h.boards.create_board(NewBoard::new("Other")).await.unwrap();

    let err = h
        .engine
        .move_task(&MoveRequest::new(
            ids[0].clone(),
            other.columns[0].id.clone(),
            0,
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.order(&h.x).await, ["a"]);
}

// =============================================================================
// Append and delete
// =============================================================================

#[tokio::test]
async fn appends_are_numbered_in_call_order() {
    let h = Harness::new().await;
    assert_eq!(h.engine.next_position(&h.x).await.unwrap(), 0);

    for i in 0..5 {
        let task = h
            .engine
            .append_task(&h.x, NewTask::new(format!("task {i}")))
            .await
            .unwrap();
        assert_eq!(task.position, i);
    }

    assert_eq!(h.engine.next_position(&h.x).await.unwrap(), 5);
    assert_eq!(
        h.order(&h.x).await,
        ["task 0", "task 1", "task 2", "task 3", "task 4"]
    );
}

#[tokio::test]
async fn append_after_moves_continues_sequence() {
    let h = Harness::new().await;
    let xs = h.fill(&h.x, &["a", "b", "c"]).await;
    h.engine
        .move_task(&MoveRequest::new(xs[0].clone(), h.y.clone(), 0))
        .await
        .unwrap();

    let appended = h.engine.append_task(&h.x, NewTask::new("d")).await.unwrap();

    assert_eq!(appended.position, 2);
    assert_eq!(h.order(&h.x).await, ["b", "c", "d"]);
}

#[tokio::test]
async fn delete_keeps_column_contiguous() {
    let h = Harness::new().await;
    let ids = h.fill(&h.x, &["a", "b", "c", "d"]).await;

    h.engine.delete_task(&ids[1]).await.unwrap();

    assert_eq!(h.order(&h.x).await, ["a", "c", "d"]);
    assert_eq!(h.engine.next_position(&h.x).await.unwrap(), 3);
}

// =============================================================================
// Failure paths
// =============================================================================

#[derive(Default)]
struct RecordingHook {
    reports: Mutex<Vec<ConflictReport>>,
}

impl ConflictHook for RecordingHook {
    fn on_conflict(&self, report: &ConflictReport) {
        self.reports.lock().push(report.clone());
    }
}

#[tokio::test]
async fn conflict_reports_column_listing() {
    let hook = Arc::new(RecordingHook::default());
    let hook_for_engine: Arc<dyn ConflictHook> = hook.clone();
    let h = Harness::with_engine(move |store| {
        RepositioningEngine::with_config(
            store,
            EngineConfig {
                sentinel: SentinelPolicy::Never,
                ..EngineConfig::default()
            },
        )
        .with_conflict_hook(hook_for_engine)
    })
    .await;
    let xs = h.fill(&h.x, &["a", "b"]).await;
    h.fill(&h.y, &["c", "d"]).await;

    // Without the sentinel the source shift collides with the moving task.
    let err = h
        .engine
        .move_task(&MoveRequest::new(xs[0].clone(), h.y.clone(), 0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.is_retryable());
    assert_eq!(h.order(&h.x).await, ["a", "b"]);
    assert_eq!(h.order(&h.y).await, ["c", "d"]);

    let reports = hook.reports.lock();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.task_id, xs[0]);
    assert_eq!(report.column_id, h.x);
    let listing: Vec<_> = report
        .listing
        .iter()
        .map(|e| (e.title.as_str(), e.position))
        .collect();
    assert_eq!(listing, [("a", 0), ("b", 1)]);
}

#[tokio::test]
async fn write_failure_mid_move_rolls_back() {
    let h = Harness::new().await;
    let xs = h.fill(&h.x, &["a", "b", "c"]).await;
    h.fill(&h.y, &["d", "e"]).await;
    let before = h.snapshot().await;

    for allowed in 0..4 {
        h.store.fail_after_writes(allowed);
        let err = h
            .engine
            .move_task(&MoveRequest::new(xs[0].clone(), h.y.clone(), 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable, "after {allowed} writes");
        assert_eq!(h.snapshot().await, before, "after {allowed} writes");
    }

    // Budget spent: the same move now succeeds.
    h.engine
        .move_task(&MoveRequest::new(xs[0].clone(), h.y.clone(), 1))
        .await
        .unwrap();
    assert_eq!(h.order(&h.y).await, ["d", "a", "e"]);
}

#[tokio::test]
async fn store_outage_is_propagated() {
    let h = Harness::new().await;
    let xs = h.fill(&h.x, &["a", "b"]).await;

    h.store.set_unavailable(true);
    let moved = h
        .engine
        .move_task(&MoveRequest::new(xs[0].clone(), h.x.clone(), 1))
        .await;
    let appended = h.engine.append_task(&h.x, NewTask::new("c")).await;
    h.store.set_unavailable(false);

    assert!(matches!(moved, Err(EngineError::StoreUnavailable(_))));
    assert!(matches!(appended, Err(EngineError::StoreUnavailable(_))));
    assert_eq!(h.order(&h.x).await, ["a", "b"]);
}
