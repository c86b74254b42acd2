//! In-memory implementations of the IPC and surface primitives.
//!
//! Used by the `usecase-shell` binary and by tests. Surfaces record what they
//! receive and expose hooks to simulate user close, renderer crashes and
//! minimization.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::dispatch::{IpcMain, RawInvokeHandler, RawListener, RequestContext};
use crate::error::{Result, ShellError};
use crate::window::{CloseObserver, Surface, SurfaceFactory, WindowId, WindowOptions};

// ============================================================================
// IPC
// ============================================================================

#[derive(Default)]
pub struct HeadlessIpc {
    handlers: RefCell<HashMap<String, RawInvokeHandler>>,
    listeners: RefCell<HashMap<String, Vec<RawListener>>>,
}

impl HeadlessIpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke a request channel as a renderer would. `None` when nothing is bound.
    pub async fn invoke(
        &self,
        channel: &str,
        sender: Option<WindowId>,
        args: Vec<Value>,
    ) -> Option<Value> {
        let handler = self.handlers.borrow().get(channel).cloned();
        let Some(handler) = handler else {
            debug!(channel = channel, "No handler bound");
            return None;
        };
        Some(handler(RequestContext::new(channel, sender), args).await)
    }

    /// Deliver a fire-and-forget message. Returns how many listeners ran.
    pub fn emit(&self, channel: &str, sender: Option<WindowId>, args: Vec<Value>) -> usize {
        let listeners = self
            .listeners
            .borrow_mut()
            .remove(channel)
            .unwrap_or_default();
        let count = listeners.len();
        for listener in listeners {
            listener(RequestContext::new(channel, sender), args.clone());
        }
        count
    }

    pub fn is_bound(&self, channel: &str) -> bool {
        self.handlers.borrow().contains_key(channel)
    }

    pub fn pending_listeners(&self, channel: &str) -> usize {
        self.listeners
            .borrow()
            .get(channel)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl IpcMain for HeadlessIpc {
    fn handle(&self, channel: &str, handler: RawInvokeHandler) {
        self.handlers
            .borrow_mut()
            .insert(channel.to_string(), handler);
    }

    fn remove_handler(&self, channel: &str) {
        self.handlers.borrow_mut().remove(channel);
    }

    fn once(&self, channel: &str, listener: RawListener) {
        self.listeners
            .borrow_mut()
            .entry(channel.to_string())
            .or_default()
            .push(listener);
    }
}

// ============================================================================
// SURFACES
// ============================================================================

/// Messages kept per surface; older ones are dropped first
pub const RECEIVED_LOG_CAPACITY: usize = 256;

pub struct HeadlessSurface {
    options: WindowOptions,
    destroyed: Cell<bool>,
    content_destroyed: Cell<bool>,
    minimized: Cell<bool>,
    deferred_close: bool,
    close_requests: Cell<usize>,
    focus_count: Cell<usize>,
    focused_while_minimized: Cell<usize>,
    received: RefCell<VecDeque<(String, Value)>>,
    observer: RefCell<Option<CloseObserver>>,
}

impl HeadlessSurface {
    fn new(options: WindowOptions, deferred_close: bool) -> Self {
        Self {
            options,
            destroyed: Cell::new(false),
            content_destroyed: Cell::new(false),
            minimized: Cell::new(false),
            deferred_close,
            close_requests: Cell::new(0),
            focus_count: Cell::new(0),
            focused_while_minimized: Cell::new(0),
            received: RefCell::new(VecDeque::new()),
            observer: RefCell::new(None),
        }
    }

    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    pub fn minimize(&self) {
        if !self.destroyed.get() {
            self.minimized.set(true);
        }
    }

    /// The user closed the window from its chrome
    pub fn simulate_user_close(&self) {
        self.finish_close();
    }

    /// The renderer died and took the window with it
    pub fn simulate_crash(&self) {
        self.content_destroyed.set(true);
        self.finish_close();
    }

    /// Tear down the content while leaving the native window up
    pub fn destroy_content(&self) {
        self.content_destroyed.set(true);
    }

    /// Complete a close, firing the observer once
    pub fn finish_close(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.content_destroyed.set(true);
        self.minimized.set(false);
        let observer = self.observer.borrow_mut().take();
        if let Some(observer) = observer {
            observer();
        }
    }

    /// Number of `close()` requests received
    pub fn close_requests(&self) -> usize {
        self.close_requests.get()
    }

    pub fn focus_count(&self) -> usize {
        self.focus_count.get()
    }

    /// Focus requests that arrived while the window was still minimized
    pub fn focused_while_minimized(&self) -> usize {
        self.focused_while_minimized.get()
    }

    /// The most recent messages delivered, oldest first (at most `RECEIVED_LOG_CAPACITY`)
    pub fn received(&self) -> Vec<(String, Value)> {
        self.received.borrow().iter().cloned().collect()
    }
}

impl Surface for HeadlessSurface {
    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn is_content_destroyed(&self) -> bool {
        self.content_destroyed.get()
    }

    fn is_minimized(&self) -> bool {
        self.minimized.get()
    }

    fn restore(&self) {
        self.minimized.set(false);
    }

    fn focus(&self) {
        self.focus_count.set(self.focus_count.get() + 1);
        if self.minimized.get() {
            self.focused_while_minimized
                .set(self.focused_while_minimized.get() + 1);
        }
    }

    fn close(&self) {
        self.close_requests.set(self.close_requests.get() + 1);
        if !self.deferred_close {
            self.finish_close();
        }
    }

    fn send(&self, channel: &str, payload: &Value) -> anyhow::Result<()> {
        if self.content_destroyed.get() {
            anyhow::bail!("content destroyed");
        }
        let mut received = self.received.borrow_mut();
        if received.len() == RECEIVED_LOG_CAPACITY {
            received.pop_front();
        }
        received.push_back((channel.to_string(), payload.clone()));
        Ok(())
    }

    fn on_closed(&self, observer: CloseObserver) {
        if self.destroyed.get() {
            observer();
        } else {
            *self.observer.borrow_mut() = Some(observer);
        }
    }
}

#[derive(Default)]
pub struct HeadlessSurfaceFactory {
    surfaces: RefCell<Vec<Rc<HeadlessSurface>>>,
    deferred_close: Cell<bool>,
    fail_next: RefCell<Option<String>>,
}

impl HeadlessSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surfaces created from now on close only when `finish_close` is called
    pub fn set_deferred_close(&self, deferred: bool) {
        self.deferred_close.set(deferred);
    }

    pub fn fail_next_create(&self, reason: impl Into<String>) {
        *self.fail_next.borrow_mut() = Some(reason.into());
    }

    /// Every surface created so far, in creation order
    pub fn surfaces(&self) -> Vec<Rc<HeadlessSurface>> {
        self.surfaces.borrow().clone()
    }

    pub fn last_created(&self) -> Option<Rc<HeadlessSurface>> {
        self.surfaces.borrow().last().cloned()
    }

    /// Forget surfaces that have finished closing. Returns how many were dropped.
    ///
    /// Long-running drivers call this so the factory does not hold every
    /// window ever opened.
    pub fn prune_closed(&self) -> usize {
        let mut surfaces = self.surfaces.borrow_mut();
        let before = surfaces.len();
        surfaces.retain(|surface| !surface.is_destroyed());
        before - surfaces.len()
    }
}

impl SurfaceFactory for HeadlessSurfaceFactory {
    fn create(&self, options: &WindowOptions) -> Result<Rc<dyn Surface>> {
        if let Some(reason) = self.fail_next.borrow_mut().take() {
            return Err(ShellError::SurfaceCreate(reason));
        }
        let surface = Rc::new(HeadlessSurface::new(
            options.clone(),
            self.deferred_close.get(),
        ));
        self.surfaces.borrow_mut().push(Rc::clone(&surface));
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn test_invoke_unbound_channel_is_none() {
        let ipc = HeadlessIpc::new();
        assert!(block_on(ipc.invoke("missing", None, vec![])).is_none());
    }

    #[test]
    fn test_once_listeners_are_consumed_together() {
        let ipc = HeadlessIpc::new();
        ipc.once("ready", Box::new(|_, _| {}));
        ipc.once("ready", Box::new(|_, _| {}));
        assert_eq!(ipc.pending_listeners("ready"), 2);
        assert_eq!(ipc.emit("ready", None, vec![]), 2);
        assert_eq!(ipc.pending_listeners("ready"), 0);
    }

    #[test]
    fn test_received_log_keeps_most_recent() {
        let surface = HeadlessSurface::new(WindowOptions::default(), false);
        for n in 0..RECEIVED_LOG_CAPACITY + 3 {
            surface.send("tick", &json!(n)).unwrap();
        }
        let received = surface.received();
        assert_eq!(received.len(), RECEIVED_LOG_CAPACITY);
        assert_eq!(received[0].1, json!(3));
        assert_eq!(received.last().unwrap().1, json!(RECEIVED_LOG_CAPACITY + 2));
    }

    #[test]
    fn test_focus_records_minimized_state() {
        let surface = HeadlessSurface::new(WindowOptions::default(), false);
        surface.minimize();
        surface.focus();
        surface.restore();
        surface.focus();
        assert_eq!(surface.focus_count(), 2);
        assert_eq!(surface.focused_while_minimized(), 1);
    }

    #[test]
    fn test_prune_closed_drops_only_destroyed_surfaces() {
        let factory = HeadlessSurfaceFactory::new();
        for _ in 0..3 {
            factory.create(&WindowOptions::default()).unwrap();
        }
        factory.surfaces()[0].simulate_user_close();
        factory.surfaces()[2].simulate_crash();

        assert_eq!(factory.prune_closed(), 2);
        assert_eq!(factory.surfaces().len(), 1);
        assert!(!factory.surfaces()[0].is_destroyed());
        assert_eq!(factory.prune_closed(), 0);
    }

    #[test]
    fn test_observer_fires_once() {
        let surface = HeadlessSurface::new(WindowOptions::default(), false);
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        surface.on_closed(Box::new(move || counter.set(counter.get() + 1)));

        surface.close();
        surface.simulate_user_close();

        assert_eq!(fired.get(), 1);
        assert!(surface.is_destroyed());
    }

    #[test]
    fn test_observer_installed_after_close_fires_immediately() {
        let surface = HeadlessSurface::new(WindowOptions::default(), false);
        surface.simulate_crash();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        surface.on_closed(Box::new(move || flag.set(true)));
        assert!(fired.get());
    }

    #[test]
    fn test_send_after_content_teardown_fails() {
        let surface = HeadlessSurface::new(WindowOptions::default(), false);
        surface.send("a", &json!(1)).unwrap();
        surface.destroy_content();
        assert!(surface.send("b", &json!(2)).is_err());
        assert_eq!(surface.received().len(), 1);
    }
}
