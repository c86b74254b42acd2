//! Structured JSONL logging plus human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (~/.usecase-shell/logs/usecase-shell.jsonl) - structured for tooling
//! - **Pretty to stderr** - human-readable for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use usecase_shell::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init(None);
//!
//! tracing::info!(event_type = "shell_lifecycle", "Shell started");
//! ```
//!
//! # JSONL Output Format
//!
//! Each line is a valid JSON object:
//! ```json
//! {"timestamp":"2026-01-05T10:30:45.123Z","level":"ERROR","target":"usecase_shell::dispatch","fields":{"channel":"boom","message":"Channel handler failed"}}
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::window::WindowId;

const LOG_FILE_NAME: &str = "usecase-shell.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// `log_dir` overrides the default log directory (usually from config).
/// Returns a guard that MUST be kept alive for the duration of the program.
pub fn init(log_dir: Option<&Path>) -> LoggingGuard {
    let log_dir = log_dir.map(Path::to_path_buf).unwrap_or_else(default_log_dir);
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file, stderr only: {}", e);
            None
        }
    };

    // Non-blocking writer keeps file I/O off the control thread
    let (json_layer, file_guard) = match file.map(tracing_appender::non_blocking) {
        Some((non_blocking_file, guard)) => {
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Pretty layer for stderr (human developers)
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init();

    tracing::info!(
        event_type = "shell_lifecycle",
        action = "logging_initialized",
        log_path = %log_path.display(),
        "Shell logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Get the default log directory path (~/.usecase-shell/logs/)
pub fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".usecase-shell").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("usecase-shell-logs"))
}

/// Get the path to the JSONL log file inside `log_dir`
pub fn log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

// =============================================================================
// STRUCTURED LOGGING HELPERS
// =============================================================================

/// Log a window lifecycle transition
pub fn log_window_event(window_id: WindowId, action: &str) {
    tracing::info!(
        event_type = "window_event",
        window_id = window_id.0,
        action = action,
        "Window {} {}",
        window_id,
        action
    );
}

/// Log a use-case lifecycle step
pub fn log_use_case_event(use_case_id: &str, action: &str) {
    tracing::debug!(
        event_type = "use_case_event",
        use_case_id = use_case_id,
        action = action,
        "Use-case {} {}",
        use_case_id,
        action
    );
}
