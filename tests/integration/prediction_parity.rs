// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::future_not_send
)]

//! The client's prediction of a move must match what the engine commits.

use std::sync::Arc;

use kanban_client::{DropTarget, OptimisticBoard, predict, resolve_drop};
use kanban_proto::{Board, BoardId, MoveRequest, NewBoard, NewTask, TaskId};
use kanban_server::RepositioningEngine;
use kanban_server::boards::BoardDirectory;
use kanban_server::store::MemoryStore;

struct Fixture {
    engine: RepositioningEngine<MemoryStore>,
    boards: BoardDirectory<MemoryStore>,
    board: BoardId,
}

impl Fixture {
    /// A board whose columns hold `sizes[i]` tasks titled `"{i}.{j}"`.
    async fn new(sizes: &[usize]) -> Self {
        let store = Arc::new(MemoryStore::new());
        let engine = RepositioningEngine::new(Arc::clone(&store));
        let boards = BoardDirectory::new(store, engine.config().lock_timeout);
        let board = boards.create_board(NewBoard::new("parity")).await.unwrap();
        for (i, &n) in sizes.iter().enumerate() {
            for j in 0..n {
                engine
                    .append_task(&board.columns[i].id, NewTask::new(format!("{i}.{j}")))
                    .await
                    .unwrap();
            }
        }
        Self {
            engine,
            boards,
            board: board.id,
        }
    }

    async fn snapshot(&self) -> Board {
        self.boards.load_board(&self.board).await.unwrap()
    }

    /// Runs `request` through both paths and checks they agree.
    async fn check(&self, request: &MoveRequest) {
        let before = self.snapshot().await;
        let predicted = predict(&before, request);
        self.engine.move_task(request).await.unwrap();
        let committed = self.snapshot().await;
        assert_eq!(committed, predicted, "request {request:?}");
    }
}

fn task_at(board: &Board, column: usize, index: usize) -> TaskId {
    board.columns[column].tasks[index].id.clone()
}

// =============================================================================
// Direct requests
// =============================================================================

#[tokio::test]
async fn every_move_from_a_small_board_matches() {
    let sizes = [3, 2, 0];
    let sample = Fixture::new(&sizes).await;
    let board = sample.snapshot().await;
    let columns = board.columns.len();

    for (c, &n) in sizes.iter().enumerate() {
        for t in 0..n {
            for dest in 0..columns {
                for target_index in -1..=4 {
                    // Fresh board per case so every request starts from the same layout.
                    let f = Fixture::new(&sizes).await;
                    let snapshot = f.snapshot().await;
                    let request = MoveRequest::new(
                        task_at(&snapshot, c, t),
                        snapshot.columns[dest].id.clone(),
                        target_index,
                    );
                    f.check(&request).await;
                }
            }
        }
    }
}

#[tokio::test]
async fn chained_moves_keep_matching() {
    let f = Fixture::new(&[4, 3, 1]).await;
    let board = f.snapshot().await;
    let x = board.columns[0].id.clone();
    let y = board.columns[1].id.clone();
    let z = board.columns[2].id.clone();
    let a = task_at(&board, 0, 0);
    let d = task_at(&board, 0, 3);
    let e = task_at(&board, 1, 0);

    for request in [
        MoveRequest::new(a.clone(), y.clone(), 2),
        MoveRequest::new(d.clone(), x.clone(), 0),
        MoveRequest::new(e.clone(), z.clone(), 0),
        MoveRequest::new(a.clone(), z.clone(), 9),
        MoveRequest::new(d, y, 1),
        MoveRequest::new(e, x, 2),
        MoveRequest::new(a, z, 0),
    ] {
        f.check(&request).await;
    }
}

// =============================================================================
// Drag and drop
// =============================================================================

#[tokio::test]
async fn resolved_drops_match_engine() {
    let f = Fixture::new(&[4, 2, 0]).await;
    let board = f.snapshot().await;
    let dragged = task_at(&board, 0, 1);

    let drops = [
        DropTarget::Task(task_at(&board, 0, 3)),
        DropTarget::Task(task_at(&board, 0, 0)),
        DropTarget::Column(board.columns[0].id.clone()),
        DropTarget::Task(task_at(&board, 1, 1)),
        DropTarget::Column(board.columns[2].id.clone()),
        DropTarget::Task(task_at(&board, 0, 2)),
    ];

    for target in &drops {
        let before = f.snapshot().await;
        let Some(request) = resolve_drop(&before, &dragged, target) else {
            continue;
        };
        f.check(&request).await;
    }

    // The dragged task ended in the empty column, then back onto X.
    let after = f.snapshot().await;
    let (column, _) = after.locate_task(&dragged).unwrap();
    assert_eq!(column, 0);
}

#[tokio::test]
async fn optimistic_view_converges_on_server_state() {
    let f = Fixture::new(&[3, 3, 0]).await;
    let board = f.snapshot().await;
    let mut local = OptimisticBoard::new(board.clone());

    let first = MoveRequest::new(task_at(&board, 0, 0), board.columns[2].id.clone(), 0);
    let second = MoveRequest::new(task_at(&board, 1, 2), board.columns[0].id.clone(), 0);
    let p1 = local.push(first.clone());
    let p2 = local.push(second.clone());
    let shown = local.view();

    f.engine.move_task(&first).await.unwrap();
    assert!(local.confirm(p1, f.snapshot().await));
    f.engine.move_task(&second).await.unwrap();
    assert!(local.confirm(p2, f.snapshot().await));

    assert_eq!(local.pending_len(), 0);
    assert_eq!(local.view(), shown);
}
