//! File logging for embedders that have no subscriber of their own.
//!
//! Writes to `<dir>/<file_name>` (truncated on start) through a non-blocking
//! writer; the filter comes from `RUST_LOG`, e.g.
//! `RUST_LOG=ime.session=debug,ime.reconcile=trace`.

use anyhow::Result;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

pub const DEFAULT_LOG_FILE: &str = "oxidized-ime.log";

/// Install the global subscriber. Returns `None` when one is already
/// installed; otherwise keep the guard alive for as long as logs should flush.
pub fn init_file_logging(dir: &Path, file_name: &str) -> Result<Option<WorkerGuard>> {
    std::fs::create_dir_all(dir)?;
    let log_path = dir.join(file_name);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // Global subscriber already installed; dropping the guard stops the writer.
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_file_and_refuses_second_install() {
        let dir = tempfile::tempdir().unwrap();
        let guard = init_file_logging(dir.path(), DEFAULT_LOG_FILE).unwrap();
        assert!(guard.is_some());
        tracing::error!(target: "ime.runtime", "logging_smoke");

        let second = init_file_logging(dir.path(), "other.log").unwrap();
        assert!(second.is_none());

        drop(guard);
        let written = std::fs::read_to_string(dir.path().join(DEFAULT_LOG_FILE)).unwrap();
        assert!(written.contains("logging_smoke"));
    }
}
