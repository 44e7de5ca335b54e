//! Client side of the kanban board.
//!
//! Renders moves before the server confirms them. [`predict`] mirrors the
//! server's repositioning on a local snapshot, [`drag`] turns drops into
//! move requests, [`optimistic`] keeps predictions apart from confirmed
//! state, and [`session`] drives all of it against the HTTP API through
//! [`net::BoardClient`].

pub mod config;
pub mod drag;
pub mod net;
pub mod optimistic;
pub mod predict;
pub mod session;

pub use config::ClientConfig;
pub use drag::{DropTarget, resolve_drop};
pub use net::{BoardClient, ClientError};
pub use optimistic::{OptimisticBoard, PendingId};
pub use predict::predict;
pub use session::BoardSession;
