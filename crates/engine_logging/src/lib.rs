#![deny(missing_docs)]
//! Shared logging utilities for the fanout workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line is tagged
//! with the run id of the thread that emitted it, so interleaved output from
//! pool workers can be told apart.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the id of the run this thread is working on.
    static RUN_ID: Cell<u64> = const { Cell::new(0) };
}

/// Sets the run id for the current thread.
/// The session thread and every pool worker call this when they start.
pub fn set_run_id(run_id: u64) {
    RUN_ID.with(|v| v.set(run_id));
}

/// Retrieves the run id for the current thread.
/// Returns 0 on threads that are not part of a run.
pub fn current_run_id() -> u64 {
    RUN_ID.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current run id.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[run {}] {}", $crate::current_run_id(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current run id.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("[run {}] {}", $crate::current_run_id(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current run id.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[run {}] {}", $crate::current_run_id(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current run id.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[run {}] {}", $crate::current_run_id(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current run id.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[run {}] {}", $crate::current_run_id(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
