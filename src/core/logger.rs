//! Tagged logging macros for pod-host
//!
//! Verbose and debug logs only emit when the corresponding config flag is
//! enabled; everything goes through the `log` facade so `env_logger` filters
//! and formats the output.

/// Debug log - only emits when debug mode is enabled
#[macro_export]
macro_rules! log_debug {
    ($tag:expr, $($arg:tt)*) => {
        if $crate::core::is_debug() {
            log::debug!("[{}] {}", $tag, format!($($arg)*));
        }
    };
}

/// Verbose log - only emits when verbose mode is enabled
#[macro_export]
macro_rules! log_verbose {
    ($tag:expr, $($arg:tt)*) => {
        if $crate::core::is_verbose() {
            log::info!("[{}] {}", $tag, format!($($arg)*));
        }
    };
}

/// Info log - always emits
#[macro_export]
macro_rules! log_info {
    ($tag:expr, $($arg:tt)*) => {
        log::info!("[{}] {}", $tag, format!($($arg)*))
    };
}

/// Warning log - always emits
#[macro_export]
macro_rules! log_warn {
    ($tag:expr, $($arg:tt)*) => {
        log::warn!("[{}] {}", $tag, format!($($arg)*))
    };
}

/// Error log - always emits
#[macro_export]
macro_rules! log_error {
    ($tag:expr, $($arg:tt)*) => {
        log::error!("[{}] {}", $tag, format!($($arg)*))
    };
}
