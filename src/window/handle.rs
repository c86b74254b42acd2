use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::surface::Surface;

/// Stable identifier for a rendering-surface window.
///
/// Assigned monotonically by the window manager, never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A window tracked by the manager.
///
/// Cloning is cheap and shares the same native surface. The surface itself is
/// crate-private: outside code can query state but not drive the window.
#[derive(Clone)]
pub struct WindowHandle {
    id: WindowId,
    surface: Rc<dyn Surface>,
}

impl WindowHandle {
    pub(crate) fn new(id: WindowId, surface: Rc<dyn Surface>) -> Self {
        WindowHandle { id, surface }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.surface.is_destroyed()
    }

    pub fn is_minimized(&self) -> bool {
        !self.surface.is_destroyed() && self.surface.is_minimized()
    }

    pub(crate) fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowHandle")
            .field("id", &self.id)
            .field("destroyed", &self.surface.is_destroyed())
            .finish()
    }
}

/// Result of `WindowManager::create_window`
#[derive(Debug, Clone)]
pub struct CreatedWindow {
    pub handle: WindowHandle,
    pub id: WindowId,
}
