//! Raw inter-process channel primitive consumed by the dispatch layer.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::window::WindowId;

/// Metadata about an incoming message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    pub channel: String,
    /// Window whose content sent the message, when known
    pub sender: Option<WindowId>,
}

impl RequestContext {
    pub fn new(channel: impl Into<String>, sender: Option<WindowId>) -> Self {
        RequestContext {
            channel: channel.into(),
            sender,
        }
    }
}

/// Request handler as the transport sees it: arguments in, wire JSON out
pub type RawInvokeHandler = Rc<dyn Fn(RequestContext, Vec<Value>) -> LocalBoxFuture<'static, Value>>;

/// Fire-and-forget listener consumed by its first message
pub type RawListener = Box<dyn FnOnce(RequestContext, Vec<Value>)>;

pub trait IpcMain {
    /// Bind `handler` to `channel`, replacing any existing binding.
    fn handle(&self, channel: &str, handler: RawInvokeHandler);

    fn remove_handler(&self, channel: &str);

    /// Queue a listener for the next message on `channel`.
    fn once(&self, channel: &str, listener: RawListener);
}
