//! Kanban board server library.
//!
//! Hosts the transactional task repositioning engine, the board services
//! built around it, and the HTTP API that exposes them. Exposed as a
//! library for tests and embedding.

pub mod api;
mod append;
pub mod boards;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod locks;
pub mod store;

pub use engine::{RepositioningEngine, SENTINEL_POSITION};
pub use error::{EngineError, ErrorKind};
