//! Raw rendering-surface primitives consumed by the window manager.
//!
//! A [`Surface`] is a native window plus its content. Methods take `&self`:
//! native windows are reference handles whose state lives in the platform.

use std::rc::Rc;

use serde_json::Value;

use super::options::WindowOptions;
use crate::error::Result;

/// Callback fired once when the surface has closed, for any reason
pub type CloseObserver = Box<dyn FnOnce()>;

pub trait Surface {
    /// True once the native window has been torn down
    fn is_destroyed(&self) -> bool;

    /// True once the content (renderer) is gone, which can happen before the window itself
    fn is_content_destroyed(&self) -> bool {
        self.is_destroyed()
    }

    fn is_minimized(&self) -> bool;

    fn restore(&self);

    fn focus(&self);

    /// Request close; the surface fires its close observer when it actually closes
    fn close(&self);

    /// Deliver a fire-and-forget message to the content
    fn send(&self, channel: &str, payload: &Value) -> anyhow::Result<()>;

    /// Install the close observer. Surfaces that are already closed fire it immediately.
    fn on_closed(&self, observer: CloseObserver);
}

/// Creates native surfaces from resolved options
pub trait SurfaceFactory {
    fn create(&self, options: &WindowOptions) -> Result<Rc<dyn Surface>>;
}
