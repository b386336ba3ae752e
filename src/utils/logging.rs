//! Module-gated logging macros.
//!
//! Each calling module defines two consts, then logs through the macros
//! (they're exported at the crate root):
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TARGET: &str = "focuspeer::session";
//!
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("points adjusted: {}", 42);
//! ```
//!
//! Flipping `ENABLE_LOGS` silences a noisy module without touching `RUST_LOG`.

/// Info-level log under the caller's `LOG_TARGET`, skipped when `ENABLE_LOGS` is false.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Warn-level log under the caller's `LOG_TARGET`, skipped when `ENABLE_LOGS` is false.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Error-level log under the caller's `LOG_TARGET`, skipped when `ENABLE_LOGS` is false.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: LOG_TARGET, $($arg)*);
        }
    };
}
