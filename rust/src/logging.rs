//! Logging macros for the task queue with verbosity level control.
//!
//! Provides zero-cost logging when disabled (verbosity=0).
//! - 0: SILENT
//! - 1: CHANGES (inserts, pops, removals)
//! - 2: DEBUG (drain and filter internals)
//!
//! Errors are returned to the caller, never logged here.

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_DEBUG: u8 = 2;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: tasks entering or leaving the queue.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 2).
///
/// Used for: drain snapshots, filter counts, heap rebuilds.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}
