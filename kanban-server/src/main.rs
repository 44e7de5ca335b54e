//! Kanban board server.
//!
//! Serves boards, columns and tasks over JSON/HTTP, backed by an
//! in-memory store.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 127.0.0.1:8080
//! cargo run --bin kanban-server
//!
//! # Run on custom address with a log file
//! cargo run --bin kanban-server -- --bind 0.0.0.0:9000 --log-file kanban.log
//!
//! # Or via environment variables
//! KANBAN_ADDR=0.0.0.0:9000 KANBAN_LOG=debug cargo run --bin kanban-server
//! ```

use std::sync::Arc;

use clap::Parser;
use kanban_server::api::{self, AppState};
use kanban_server::config::{ServerCliArgs, ServerConfig};
use kanban_server::store::MemoryStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // The guard must live until exit so buffered log lines are flushed.
    let _log_guard = init_logging(&config);

    tracing::info!(
        addr = %config.bind_addr,
        unique_positions = config.enforce_unique_positions,
        sentinel = ?config.engine.sentinel,
        "starting kanban server"
    );

    let store = Arc::new(MemoryStore::with_unique_positions(
        config.enforce_unique_positions,
    ));
    let state = Arc::new(AppState::new(store, config.engine.clone()));

    match api::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "kanban server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "kanban server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start kanban server");
            std::process::exit(1);
        }
    }
}

/// Installs the global subscriber, writing to `config.log_file` when set.
fn init_logging(config: &ServerConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    let Some(path) = &config.log_file else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        return None;
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path
        .file_name()
        .map_or_else(|| "kanban-server.log".into(), std::ffi::OsStr::to_os_string);

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}
