//! Window lifecycle manager
//!
//! Owns the id → window mapping. Every window goes `Created → Live → Closed`;
//! the close observer installed at creation and `close_all_windows` both end in
//! [`forget`], so the mapping never holds an id whose window has closed.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::handle::{CreatedWindow, WindowHandle, WindowId};
use super::options::{WindowOptions, WindowOverrides};
use super::surface::SurfaceFactory;
use crate::error::Result;
use crate::logging;

type WindowMap = BTreeMap<WindowId, WindowHandle>;

pub struct WindowManager {
    factory: Rc<dyn SurfaceFactory>,
    defaults: WindowOptions,
    windows: Rc<RefCell<WindowMap>>,
    next_id: Cell<u64>,
}

impl WindowManager {
    pub fn new(factory: Rc<dyn SurfaceFactory>, defaults: WindowOptions) -> Self {
        Self {
            factory,
            defaults,
            windows: Rc::new(RefCell::new(BTreeMap::new())),
            next_id: Cell::new(1),
        }
    }

    /// Options every window starts from before caller overrides
    pub fn defaults(&self) -> &WindowOptions {
        &self.defaults
    }

    /// Create a window from the defaults merged with `overrides`.
    pub fn create_window(&self, overrides: &WindowOverrides) -> Result<CreatedWindow> {
        let options = self.defaults.merged(overrides);
        let surface = self.factory.create(&options)?;

        let id = WindowId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let handle = WindowHandle::new(id, Rc::clone(&surface));
        self.windows.borrow_mut().insert(id, handle.clone());

        // Weak so a surface outliving the manager doesn't keep the map alive
        let windows: Weak<RefCell<WindowMap>> = Rc::downgrade(&self.windows);
        surface.on_closed(Box::new(move || {
            if let Some(windows) = windows.upgrade() {
                forget(&windows, id);
            }
        }));

        logging::log_window_event(id, "created");
        Ok(CreatedWindow { handle, id })
    }

    /// Restore (if minimized) and focus a live window. Unknown or destroyed ids are ignored.
    pub fn focus_window(&self, id: WindowId) {
        let Some(handle) = self.get_window_by_id(id) else {
            debug!(window_id = id.0, "focus_window: unknown window");
            return;
        };
        let surface = handle.surface();
        if surface.is_destroyed() {
            debug!(window_id = id.0, "focus_window: window already destroyed");
            return;
        }
        if surface.is_minimized() {
            surface.restore();
        }
        surface.focus();
    }

    pub fn get_window_by_id(&self, id: WindowId) -> Option<WindowHandle> {
        self.windows.borrow().get(&id).cloned()
    }

    /// Snapshot of all live windows
    pub fn get_all_windows(&self) -> BTreeMap<WindowId, WindowHandle> {
        self.windows.borrow().clone()
    }

    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.borrow().keys().copied().collect()
    }

    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    /// Close one window. Returns false when the id was not tracked.
    pub fn close_window(&self, id: WindowId) -> bool {
        let Some(handle) = self.get_window_by_id(id) else {
            return false;
        };
        if !handle.surface().is_destroyed() {
            handle.surface().close();
        }
        // Surfaces that close asynchronously haven't fired their observer yet
        forget(&self.windows, id);
        true
    }

    /// Close every live window and clear the mapping.
    pub fn close_all_windows(&self) {
        // Observers borrow the map mutably while close() runs
        let handles: Vec<WindowHandle> = self.windows.borrow().values().cloned().collect();

        for handle in &handles {
            if handle.surface().is_destroyed() {
                continue;
            }
            handle.surface().close();
        }

        self.windows.borrow_mut().clear();
        debug!(count = handles.len(), "Closed all windows");
    }
}

fn forget(windows: &RefCell<WindowMap>, id: WindowId) {
    let removed = match windows.try_borrow_mut() {
        Ok(mut map) => map.remove(&id).is_some(),
        Err(_) => {
            debug!(window_id = id.0, "Window map busy during close; leaving removal to owner");
            false
        }
    };
    if removed {
        logging::log_window_event(id, "closed");
    }
}
