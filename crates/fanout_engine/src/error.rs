use std::io;

use thiserror::Error;

/// Failures of the engine itself, as opposed to per-task fetch failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },
    #[error("run thread panicked: {message}")]
    Panicked { message: String },
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("run ended with {executed} of {total} tasks executed and no termination observed")]
    IncompleteRun { executed: usize, total: usize },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a run is already in progress")]
    AlreadyRunning,
    #[error("failed to spawn run thread: {0}")]
    Spawn(#[from] io::Error),
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
