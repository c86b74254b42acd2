//! External command handling via stdin.
//!
//! Drives a headless shell with JSONL commands, primarily for testing and
//! automation. Each command produces exactly one JSON response line.
//!
//! # Protocol
//!
//! ```json
//! {"type": "invoke", "channel": "diagnostics:ping", "args": []}
//! {"type": "emit", "channel": "renderer:ready", "sender": 1}
//! {"type": "openWindow", "useCaseId": "diagnostics", "options": {"width": 640}}
//! {"type": "focusWindow", "id": 1}
//! {"type": "send", "id": 1, "channel": "theme", "data": "dark"}
//! {"type": "broadcast", "channel": "theme", "data": "light"}
//! {"type": "closeWindow", "id": 1}
//! {"type": "closeAll"}
//! {"type": "listWindows"}
//! {"type": "shutdown"}
//! ```
//!
//! Every command accepts an optional `requestId`, echoed in the response and
//! logged with the command so a run can be traced through the logs.
//!
//! # Example Usage
//!
//! ```bash
//! echo '{"type": "invoke", "channel": "diagnostics:ping"}' | ./usecase-shell
//! # {"requestId":null,"ok":true,"result":{"success":true,"data":"pong"}}
//! ```

use futures::executor::block_on;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{Result, ShellError};
use crate::headless::HeadlessIpc;
use crate::shell::Shell;
use crate::window::{WindowId, WindowOverrides};

/// External commands that can be sent to the shell via stdin
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExternalCommand {
    /// Invoke a request channel as a renderer would
    Invoke {
        channel: String,
        #[serde(default)]
        args: Vec<Value>,
        /// Window id to report as the sender
        #[serde(default)]
        sender: Option<u64>,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Fire-and-forget message to `once` listeners
    Emit {
        channel: String,
        #[serde(default)]
        args: Vec<Value>,
        #[serde(default)]
        sender: Option<u64>,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Open a window, for a use-case when `useCaseId` is given
    OpenWindow {
        #[serde(default, rename = "useCaseId")]
        use_case_id: Option<String>,
        #[serde(default)]
        options: Option<WindowOverrides>,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    FocusWindow {
        id: u64,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    CloseWindow {
        id: u64,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    CloseAll {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Send a message to one window's content
    Send {
        id: u64,
        channel: String,
        #[serde(default)]
        data: Value,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Send a message to every live window
    Broadcast {
        channel: String,
        #[serde(default)]
        data: Value,
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    ListWindows {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
    /// Close windows, clean up use-cases and stop reading commands
    Shutdown {
        #[serde(default, rename = "requestId")]
        request_id: Option<String>,
    },
}

impl ExternalCommand {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ExternalCommand::Invoke { request_id, .. }
            | ExternalCommand::Emit { request_id, .. }
            | ExternalCommand::OpenWindow { request_id, .. }
            | ExternalCommand::FocusWindow { request_id, .. }
            | ExternalCommand::CloseWindow { request_id, .. }
            | ExternalCommand::CloseAll { request_id }
            | ExternalCommand::Send { request_id, .. }
            | ExternalCommand::Broadcast { request_id, .. }
            | ExternalCommand::ListWindows { request_id }
            | ExternalCommand::Shutdown { request_id } => request_id.as_deref(),
        }
    }
}

/// What the command loop should do after a command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub response: Value,
    pub exit: bool,
}

/// Parse one JSONL line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Result<ExternalCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str(line).map_err(ShellError::from))
}

/// Response line for input that did not parse
pub fn parse_error_response(error: &ShellError) -> Value {
    json!({ "requestId": null, "ok": false, "error": error.user_message() })
}

/// Run one command against the shell on the control thread.
pub fn execute(shell: &Shell, ipc: &HeadlessIpc, command: ExternalCommand) -> CommandOutcome {
    let request_id = command.request_id().map(str::to_string);
    info!(request_id = ?request_id, command = ?command, "Executing external command");

    let mut exit = false;
    let result: Result<Value> = match command {
        ExternalCommand::Invoke {
            channel,
            args,
            sender,
            ..
        } => match block_on(ipc.invoke(&channel, sender.map(WindowId), args)) {
            Some(envelope) => Ok(envelope),
            None => Err(ShellError::UnboundChannel(channel)),
        },
        ExternalCommand::Emit {
            channel,
            args,
            sender,
            ..
        } => {
            let delivered = ipc.emit(&channel, sender.map(WindowId), args);
            Ok(json!({ "listeners": delivered }))
        }
        ExternalCommand::OpenWindow {
            use_case_id,
            options,
            ..
        } => {
            let overrides = options.unwrap_or_default();
            let created = match use_case_id.as_deref() {
                Some(id) => shell.open_window(id, &overrides),
                None => shell.open_main_window(&overrides),
            };
            created.map(|created| json!({ "id": created.id }))
        }
        ExternalCommand::FocusWindow { id, .. } => {
            shell.focus_window(WindowId(id)).map(|()| json!(true))
        }
        ExternalCommand::CloseWindow { id, .. } => {
            shell.close_window(WindowId(id)).map(|()| json!(true))
        }
        ExternalCommand::CloseAll { .. } => {
            shell.windows().close_all_windows();
            Ok(Value::Null)
        }
        ExternalCommand::Send {
            id, channel, data, ..
        } => Ok(json!({ "delivered": shell.send_to(WindowId(id), &channel, &data) })),
        ExternalCommand::Broadcast { channel, data, .. } => {
            Ok(json!({ "delivered": shell.broadcast(&channel, &data) }))
        }
        ExternalCommand::ListWindows { .. } => Ok(json!(shell.windows().window_ids())),
        ExternalCommand::Shutdown { .. } => {
            shell.shutdown();
            exit = true;
            Ok(Value::Null)
        }
    };

    let response = match result {
        Ok(value) => json!({ "requestId": request_id, "ok": true, "result": value }),
        Err(error) => {
            error.log(request_id.as_deref());
            json!({ "requestId": request_id, "ok": false, "error": error.user_message() })
        }
    };
    CommandOutcome { response, exit }
}

/// Start a thread that reads stdin and forwards parsed lines to the control thread.
///
/// The thread never touches shell state; the receiver side executes commands.
pub fn start_stdin_listener() -> async_channel::Receiver<String> {
    use std::io::BufRead;

    // Bounded so a flood of input applies backpressure to the reader thread
    let (tx, rx) = async_channel::bounded(100);

    std::thread::spawn(move || {
        debug!("External command listener started");
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send_blocking(line).is_err() {
                        debug!("Command channel closed, exiting");
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Error reading stdin");
                    break;
                }
            }
        }
        debug!("External command listener exiting");
    });

    rx
}

// ============================================================================
// Tests
// ============================================================================
