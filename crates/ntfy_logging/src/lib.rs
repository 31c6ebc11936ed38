#![deny(missing_docs)]
//! Shared logging utilities for the listener workspace.
//!
//! This crate provides the `ntfy_*` logging macros used across the codebase,
//! a helper for keeping logged payloads short, and a minimal test initializer
//! for the global logger.

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! ntfy_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! ntfy_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! ntfy_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! ntfy_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! ntfy_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Maximum number of characters of a raw payload included in a log line.
pub const PAYLOAD_PREVIEW_CHARS: usize = 120;

/// Returns a log-safe preview of a raw payload line.
///
/// Invalid UTF-8 is replaced lossily and the result is cut at
/// [`PAYLOAD_PREVIEW_CHARS`] characters with a trailing ellipsis.
pub fn payload_preview(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut preview: String = text.chars().take(PAYLOAD_PREVIEW_CHARS).collect();
    if text.chars().count() > PAYLOAD_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
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
