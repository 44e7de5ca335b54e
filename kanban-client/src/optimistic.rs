//! Local board state with moves that the server has not confirmed yet.
//!
//! The last board received from the server is kept as the confirmed
//! snapshot. Moves sent but not yet answered are queued in order, and
//! [`OptimisticBoard::view`] renders the confirmed snapshot with every
//! queued move predicted on top. Confirming or rejecting a move simply
//! removes it from the queue, so a failed move disappears from the view
//! without any undo bookkeeping.

use kanban_proto::{Board, MoveRequest};

use crate::predict;

/// Handle for one pending move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingId(u64);

#[derive(Debug, Clone)]
struct PendingMove {
    id: PendingId,
    request: MoveRequest,
}

/// Confirmed snapshot plus the ordered list of in-flight moves.
#[derive(Debug, Clone)]
pub struct OptimisticBoard {
    confirmed: Board,
    pending: Vec<PendingMove>,
    next_id: u64,
}

impl OptimisticBoard {
    /// Starts from a server snapshot with nothing pending.
    #[must_use]
    pub const fn new(confirmed: Board) -> Self {
        Self {
            confirmed,
            pending: Vec::new(),
            next_id: 0,
        }
    }

    /// The last snapshot received from the server.
    #[must_use]
    pub const fn confirmed(&self) -> &Board {
        &self.confirmed
    }

    /// Number of moves awaiting an answer.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// What the user should see: the confirmed snapshot with every pending
    /// move applied in the order it was made.
    #[must_use]
    pub fn view(&self) -> Board {
        let mut board = self.confirmed.clone();
        for pending in &self.pending {
            predict::apply(&mut board, &pending.request);
        }
        board
    }

    /// Queues a move that is about to be sent.
    pub fn push(&mut self, request: MoveRequest) -> PendingId {
        let id = PendingId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingMove { id, request });
        id
    }

    /// The server accepted the move; `server_board` is its fresh snapshot.
    ///
    /// Returns `false` if `id` was not pending (the snapshot is still taken).
    pub fn confirm(&mut self, id: PendingId, server_board: Board) -> bool {
        self.confirmed = server_board;
        self.remove(id)
    }

    /// The server refused the move or it could not be delivered.
    ///
    /// Returns `false` if `id` was not pending.
    pub fn reject(&mut self, id: PendingId) -> bool {
        let removed = self.remove(id);
        if removed {
            tracing::debug!(pending = ?id, "discarded rejected prediction");
        }
        removed
    }

    /// Replaces the confirmed snapshot, keeping pending moves.
    pub fn refresh(&mut self, server_board: Board) {
        self.confirmed = server_board;
    }

    fn remove(&mut self, id: PendingId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }
}
