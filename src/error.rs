//! Error taxonomy for every fallible component, converging on [`JoinError`].

use thiserror::Error;

/// Errors raised while loading a relation from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A single malformed CSV line. Never fatal; the loader logs and skips it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: expected {expected} fields, got {actual}")]
pub struct ParseError {
    /// 1-based line number within the data section (header excluded).
    pub line: usize,
    /// Declared schema arity.
    pub expected: usize,
    /// Fields actually found.
    pub actual: usize,
}

/// Errors raised by the bounded thread pool.
#[derive(Error, Debug)]
pub enum ThreadPoolError {
    /// A task was submitted after the pool began shutting down.
    #[error("submit on a thread pool that is shutting down")]
    Shutdown,
    /// A submitted task panicked; its payload is not `Send` so only a message survives.
    #[error("task panicked: {0}")]
    TaskPanicked(String),
}

/// Crate-level error surfaced by the join dispatcher.
#[derive(Error, Debug)]
pub enum JoinError {
    /// A named algorithm failed to complete.
    #[error("join algorithm '{algorithm}' failed: {reason}")]
    AlgorithmFailed {
        /// The algorithm that failed, e.g. `"radix_partition"`.
        algorithm: &'static str,
        /// Human-readable failure reason.
        reason: String,
    },
    /// The thread pool could not service the join.
    #[error(transparent)]
    ThreadPool(#[from] ThreadPoolError),
}

/// Extract a human-readable message from a caught panic payload. Shared by
/// every worker-spawning join strategy and by [`crate::pool::ThreadPool`]
/// itself, since a panic payload is `Any + Send` but not `Display`.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
