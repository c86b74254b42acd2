//! Built-in use-cases shipped with the shell
//!
//! `diagnostics` answers a handful of channels that are useful for checking a
//! renderer's connection to the control process end to end.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::dispatch::ChannelDispatch;
use crate::usecase::{UseCase, UseCaseDescriptor};
use crate::window::{WindowHandle, WindowId};

pub const DIAGNOSTICS_ID: &str = "diagnostics";

pub struct DiagnosticsUseCase {
    descriptor: UseCaseDescriptor,
    windows: Rc<RefCell<Vec<WindowId>>>,
}

impl Default for DiagnosticsUseCase {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsUseCase {
    pub fn new() -> Self {
        DiagnosticsUseCase {
            descriptor: UseCaseDescriptor::new(
                DIAGNOSTICS_ID,
                "Diagnostics",
                "system",
                vec!["ipc", "health", "debug"],
            ),
            windows: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Windows opened for this use-case, in creation order
    pub fn windows_opened(&self) -> Vec<WindowId> {
        self.windows.borrow().clone()
    }
}

impl UseCase for DiagnosticsUseCase {
    fn descriptor(&self) -> &UseCaseDescriptor {
        &self.descriptor
    }

    fn register_channel_handlers(&self, dispatch: &ChannelDispatch) {
        dispatch.register_handler("diagnostics:ping", |_ctx, _args| async { Ok("pong") });

        dispatch.register_handler("diagnostics:echo", |_ctx, args| async move {
            Ok(Value::Array(args))
        });

        // Always fails; exercises the failure envelope from a renderer
        dispatch.register_handler("diagnostics:fail", |_ctx, args| async move {
            let reason = args
                .first()
                .and_then(Value::as_str)
                .unwrap_or("requested failure")
                .to_string();
            Err::<Value, _>(anyhow::anyhow!(reason))
        });

        let windows = Rc::clone(&self.windows);
        dispatch.register_handler("diagnostics:status", move |ctx, _args| {
            let opened = windows.borrow().clone();
            async move {
                Ok(json!({
                    "sender": ctx.sender,
                    "windowsOpened": opened,
                    "version": env!("CARGO_PKG_VERSION"),
                }))
            }
        });
    }

    fn on_window_created(&self, window: &WindowHandle) {
        debug!(window_id = window.id().0, "Diagnostics window opened");
        self.windows.borrow_mut().push(window.id());
    }

    fn cleanup(&self) -> anyhow::Result<()> {
        info!(
            windows_opened = self.windows.borrow().len(),
            "Diagnostics use-case cleaned up"
        );
        self.windows.borrow_mut().clear();
        Ok(())
    }
}
