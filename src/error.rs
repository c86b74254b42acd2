use thiserror::Error;
use tracing::{error, info, warn};

use crate::window::WindowId;

/// Error severity for operator-facing reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // informational
    Warning,  // recoverable
    Error,    // operation failed
    Critical, // shell cannot continue
}

/// Domain-specific errors for the control-process core
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Failed to create rendering surface: {0}")]
    SurfaceCreate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration '{path}': {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse protocol message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("No handler registered for channel: {0}")]
    UnboundChannel(String),

    #[error("Unknown use-case: {0}")]
    UnknownUseCase(String),

    #[error("Unknown window: {0}")]
    UnknownWindow(WindowId),
}

impl ShellError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::SurfaceCreate(_) => ErrorSeverity::Critical,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::ConfigParse { .. } => ErrorSeverity::Warning,
            Self::Protocol(_) => ErrorSeverity::Warning,
            Self::UnboundChannel(_) => ErrorSeverity::Warning,
            Self::UnknownUseCase(_) => ErrorSeverity::Error,
            Self::UnknownWindow(_) => ErrorSeverity::Info,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::SurfaceCreate(msg) => format!("Could not open window: {}", msg),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::ConfigParse { path, .. } => format!("Could not read configuration from {}", path),
            Self::Protocol(e) => format!("Invalid command: {}", e),
            Self::UnboundChannel(channel) => format!("No handler registered for channel '{}'", channel),
            Self::UnknownUseCase(id) => format!("No use-case named '{}'", id),
            Self::UnknownWindow(id) => format!("Window {} is not open", id),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

/// Turn a recoverable failure into `None`, logging it as a warning at the call site.
pub trait ResultExt<T> {
    fn warn_on_err(self, action: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn warn_on_err(self, action: &str) -> Option<T> {
        self.map_err(|error| {
            let caller = std::panic::Location::caller();
            warn!(
                action = action,
                error = %error,
                location = %format!("{}:{}", caller.file(), caller.line()),
                "Could not {}; continuing",
                action
            );
        })
        .ok()
    }
}

impl ShellError {
    /// Log at the level that matches this error's severity.
    pub fn log(&self, request_id: Option<&str>) {
        match self.severity() {
            ErrorSeverity::Info => info!(request_id = ?request_id, error = %self, "Request not applicable"),
            ErrorSeverity::Warning => warn!(request_id = ?request_id, error = %self, "Request rejected"),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                error!(request_id = ?request_id, severity = ?self.severity(), error = %self, "Request failed")
            }
        }
    }
}

/// Render a panic payload as a message.
///
/// `panic!("literal")` carries a `&'static str`, formatted panics carry a `String`.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(
            ShellError::SurfaceCreate("gpu lost".into()).severity(),
            ErrorSeverity::Critical
        );
        assert_eq!(
            ShellError::UnknownWindow(WindowId(3)).severity(),
            ErrorSeverity::Info
        );
    }

    #[test]
    fn test_user_message_names_the_target() {
        let err = ShellError::UnknownUseCase("clipboard".into());
        assert_eq!(err.user_message(), "No use-case named 'clipboard'");
        assert_eq!(err.to_string(), "Unknown use-case: clipboard");
    }

    #[test]
    fn test_warn_on_err_keeps_ok_drops_err() {
        let ok: std::result::Result<u8, String> = Ok(7);
        assert_eq!(ok.warn_on_err("read value"), Some(7));
        let err: std::result::Result<u8, String> = Err("nope".into());
        assert_eq!(err.warn_on_err("read value"), None);
    }

    #[test]
    fn test_protocol_errors_convert_from_serde() {
        let parse = serde_json::from_str::<u8>("{").unwrap_err();
        let err = ShellError::from(parse);
        assert!(matches!(err, ShellError::Protocol(_)));
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.user_message().starts_with("Invalid command: "));
    }

    #[test]
    fn test_panic_message_extracts_str_and_string() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(boxed.as_ref()), "static");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(boxed.as_ref()), "handler panicked");
    }
}
