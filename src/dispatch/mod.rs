//! Channel dispatch layer
//!
//! Wraps the raw [`IpcMain`] primitive so every request handler answers with an
//! [`Envelope`], and delivers fire-and-forget messages to windows without ever
//! failing on a window that has already gone away.
//!
//! ```rust,ignore
//! dispatch.register_handler("ping", |_ctx, _args| async { Ok("pong") });
//! // invoking "ping" answers {"success": true, "data": "pong"}
//! ```

mod envelope;
mod ipc;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::panic_message;
use crate::window::WindowHandle;

pub use envelope::Envelope;
pub use ipc::{IpcMain, RawInvokeHandler, RawListener, RequestContext};

pub struct ChannelDispatch {
    ipc: Rc<dyn IpcMain>,
    channels: RefCell<BTreeSet<String>>,
}

impl ChannelDispatch {
    pub fn new(ipc: Rc<dyn IpcMain>) -> Self {
        Self {
            ipc,
            channels: RefCell::new(BTreeSet::new()),
        }
    }

    /// Bind an async request handler to `channel`. Last registration wins.
    ///
    /// Errors, panics and unserializable results all come back as
    /// `Envelope::Failure` and are logged with the channel name.
    pub fn register_handler<F, Fut, T>(&self, channel: &str, handler: F)
    where
        F: Fn(RequestContext, Vec<Value>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<T>> + 'static,
        T: Serialize,
    {
        let handler = Rc::new(handler);
        let raw: RawInvokeHandler = Rc::new(move |ctx: RequestContext, args: Vec<Value>| {
            let handler = Rc::clone(&handler);
            async move {
                let channel = ctx.channel.clone();
                settle(&channel, async move { (*handler)(ctx, args).await })
                    .await
                    .to_wire()
            }
            .boxed_local()
        });

        if !self.channels.borrow_mut().insert(channel.to_string()) {
            debug!(channel = channel, "Replacing existing channel handler");
        }
        self.ipc.remove_handler(channel);
        self.ipc.handle(channel, raw);
    }

    pub fn remove_handler(&self, channel: &str) {
        self.channels.borrow_mut().remove(channel);
        self.ipc.remove_handler(channel);
    }

    pub fn has_handler(&self, channel: &str) -> bool {
        self.channels.borrow().contains(channel)
    }

    /// Channels registered through this layer, sorted
    pub fn channels(&self) -> Vec<String> {
        self.channels.borrow().iter().cloned().collect()
    }

    /// Deliver `data` on `channel` to one window. Returns whether it was delivered.
    ///
    /// A window (or content) that is already torn down is a silent no-op.
    pub fn send_message(&self, window: &WindowHandle, channel: &str, data: &Value) -> bool {
        let surface = window.surface();
        if surface.is_destroyed() || surface.is_content_destroyed() {
            debug!(window_id = window.id().0, channel = channel, "Skipping send to closed window");
            return false;
        }
        match surface.send(channel, data) {
            Ok(()) => true,
            Err(e) => {
                // Teardown can race the destroyed check
                debug!(window_id = window.id().0, channel = channel, error = %e, "Send dropped");
                false
            }
        }
    }

    /// `send_message` to each window independently. Returns the delivery count.
    pub fn broadcast_message<'a, I>(&self, windows: I, channel: &str, data: &Value) -> usize
    where
        I: IntoIterator<Item = &'a WindowHandle>,
    {
        windows
            .into_iter()
            .filter(|window| self.send_message(window, channel, data))
            .count()
    }

    /// Listen for the next message on `channel` only.
    pub fn once<F>(&self, channel: &str, listener: F)
    where
        F: FnOnce(RequestContext, Vec<Value>) + 'static,
    {
        self.ipc.once(channel, Box::new(listener));
    }
}

async fn settle<Fut, T>(channel: &str, outcome: Fut) -> Envelope
where
    Fut: Future<Output = anyhow::Result<T>>,
    T: Serialize,
{
    let result = match AssertUnwindSafe(outcome).catch_unwind().await {
        Ok(Ok(value)) => serde_json::to_value(value).map_err(anyhow::Error::from),
        Ok(Err(err)) => Err(err),
        Err(payload) => Err(anyhow::anyhow!(panic_message(payload.as_ref()))),
    };

    if let Err(err) = &result {
        error!(channel = channel, error = %err, "Channel handler failed");
    }
    Envelope::from_result(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessIpc, HeadlessSurfaceFactory};
    use crate::window::{WindowManager, WindowOptions, WindowOverrides};
    use futures::executor::block_on;
    use serde_json::json;
    use std::cell::Cell;

    fn dispatch() -> (ChannelDispatch, Rc<HeadlessIpc>) {
        let ipc = Rc::new(HeadlessIpc::new());
        (ChannelDispatch::new(ipc.clone()), ipc)
    }

    #[test]
    fn test_ping_returns_success_envelope() {
        let (dispatch, ipc) = dispatch();
        dispatch.register_handler("ping", |_ctx, _args| async { Ok("pong") });

        let response = block_on(ipc.invoke("ping", None, vec![])).unwrap();
        assert_eq!(response, json!({"success": true, "data": "pong"}));
    }

    #[test]
    fn test_failing_handler_returns_failure_and_keeps_serving() {
        let (dispatch, ipc) = dispatch();
        dispatch.register_handler("boom", |_ctx, _args| async {
            Err::<Value, _>(anyhow::anyhow!("bad input"))
        });
        dispatch.register_handler("ping", |_ctx, _args| async { Ok("pong") });

        let failed = block_on(ipc.invoke("boom", None, vec![])).unwrap();
        assert_eq!(failed, json!({"success": false, "error": "bad input"}));

        let again = block_on(ipc.invoke("boom", None, vec![])).unwrap();
        assert_eq!(again, failed);
        let ok = block_on(ipc.invoke("ping", None, vec![])).unwrap();
        assert_eq!(ok["success"], json!(true));
    }

    #[test]
    fn test_panicking_handler_becomes_failure() {
        let (dispatch, ipc) = dispatch();
        dispatch.register_handler("panics", |_ctx, _args| async {
            if true {
                panic!("exploded");
            }
            Ok(0)
        });

        let response = block_on(ipc.invoke("panics", None, vec![])).unwrap();
        assert_eq!(response, json!({"success": false, "error": "exploded"}));
    }

    #[test]
    fn test_handler_receives_args_and_sender() {
        let (dispatch, ipc) = dispatch();
        dispatch.register_handler("sum", |ctx, args| async move {
            let total: i64 = args.iter().filter_map(Value::as_i64).sum();
            Ok(json!({"total": total, "sender": ctx.sender, "channel": ctx.channel}))
        });

        let response = block_on(ipc.invoke(
            "sum",
            Some(crate::window::WindowId(4)),
            vec![json!(2), json!(3)],
        ))
        .unwrap();
        assert_eq!(
            response["data"],
            json!({"total": 5, "sender": 4, "channel": "sum"})
        );
    }

    #[test]
    fn test_reregistering_replaces_handler() {
        let (dispatch, ipc) = dispatch();
        dispatch.register_handler("version", |_ctx, _args| async { Ok(1) });
        dispatch.register_handler("version", |_ctx, _args| async { Ok(2) });

        let response = block_on(ipc.invoke("version", None, vec![])).unwrap();
        assert_eq!(response["data"], json!(2));
        assert_eq!(dispatch.channels(), vec!["version".to_string()]);
    }

    #[test]
    fn test_removed_handler_is_gone() {
        let (dispatch, ipc) = dispatch();
        dispatch.register_handler("temp", |_ctx, _args| async { Ok(()) });
        assert!(dispatch.has_handler("temp"));
        dispatch.remove_handler("temp");
        assert!(!dispatch.has_handler("temp"));
        assert!(block_on(ipc.invoke("temp", None, vec![])).is_none());
    }

    #[test]
    fn test_send_to_closed_window_is_silent_noop() {
        let (dispatch, _ipc) = dispatch();
        let factory = Rc::new(HeadlessSurfaceFactory::new());
        let windows = WindowManager::new(factory.clone(), WindowOptions::default());
        let created = windows.create_window(&WindowOverrides::default()).unwrap();

        assert!(dispatch.send_message(&created.handle, "tick", &json!(1)));
        windows.close_window(created.id);
        assert!(!dispatch.send_message(&created.handle, "tick", &json!(2)));

        let surface = factory.last_created().unwrap();
        assert_eq!(surface.received(), vec![("tick".to_string(), json!(1))]);
    }

    #[test]
    fn test_broadcast_skips_dead_windows_independently() {
        let (dispatch, _ipc) = dispatch();
        let factory = Rc::new(HeadlessSurfaceFactory::new());
        let windows = WindowManager::new(factory.clone(), WindowOptions::default());
        let handles: Vec<_> = (0..3)
            .map(|_| windows.create_window(&WindowOverrides::default()).unwrap().handle)
            .collect();
        factory.surfaces()[0].simulate_crash();
        factory.surfaces()[2].destroy_content();

        let delivered = dispatch.broadcast_message(&handles, "theme", &json!("dark"));

        assert_eq!(delivered, 1);
        assert_eq!(factory.surfaces()[1].received().len(), 1);
        assert!(factory.surfaces()[2].received().is_empty());
    }

    #[test]
    fn test_once_fires_a_single_time() {
        let (dispatch, ipc) = dispatch();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        dispatch.once("ready", move |_ctx, args| {
            assert_eq!(args, vec![json!("first")]);
            seen.set(seen.get() + 1);
        });

        assert_eq!(ipc.emit("ready", None, vec![json!("first")]), 1);
        assert_eq!(ipc.emit("ready", None, vec![json!("second")]), 0);
        assert_eq!(hits.get(), 1);
    }
}
