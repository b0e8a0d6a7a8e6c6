#![deny(missing_docs)]
//! Shared logging utilities for the sitemap poller workspace.
//!
//! This crate provides the `poller_*` logging macros used across the codebase,
//! a per-thread poll tick that the macros stamp onto each line, and a minimal
//! test initializer for the global logger.

use std::cell::Cell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Poll tick of the status request currently being handled on this thread.
    static POLL_TICK: Cell<u64> = const { Cell::new(0) };
}

/// Sets the poll tick for the current thread.
/// A tick of 0 means "not inside a poll" and suppresses the prefix.
pub fn set_poll_tick(tick: u64) {
    POLL_TICK.with(|v| v.set(tick));
}

/// Retrieves the poll tick for the current thread.
/// Returns 0 if the tick has not been set.
pub fn get_poll_tick() -> u64 {
    POLL_TICK.with(|v| v.get())
}

/// Restores the previous poll tick when dropped.
///
/// Async tasks may hop threads across `.await`, so hold the guard only
/// around synchronous logging.
#[must_use = "the tick is reset as soon as the guard is dropped"]
pub struct PollTickGuard {
    previous: u64,
}

/// Sets the poll tick for the current thread until the returned guard is dropped.
pub fn enter_poll_tick(tick: u64) -> PollTickGuard {
    let previous = get_poll_tick();
    set_poll_tick(tick);
    PollTickGuard { previous }
}

impl Drop for PollTickGuard {
    fn drop(&mut self) {
        set_poll_tick(self.previous);
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __poller_log {
    ($level:ident, $($arg:tt)*) => {{
        match $crate::get_poll_tick() {
            0 => $crate::log::$level!($($arg)*),
            tick => $crate::log::$level!("[poll {}] {}", tick, format_args!($($arg)*)),
        }
    }};
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! poller_trace {
    ($($arg:tt)*) => {{
        $crate::__poller_log!(trace, $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! poller_info {
    ($($arg:tt)*) => {{
        $crate::__poller_log!(info, $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! poller_debug {
    ($($arg:tt)*) => {{
        $crate::__poller_log!(debug, $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! poller_warn {
    ($($arg:tt)*) => {{
        $crate::__poller_log!(warn, $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! poller_error {
    ($($arg:tt)*) => {{
        $crate::__poller_log!(error, $($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
