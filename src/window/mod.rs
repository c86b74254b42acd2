//! Window lifecycle management
//!
//! Rendering surfaces are created through a [`SurfaceFactory`], tracked by a
//! monotonically assigned [`WindowId`], and dropped from tracking as soon as
//! they close.

mod handle;
mod manager;
mod options;
mod surface;

pub use handle::{CreatedWindow, WindowHandle, WindowId};
pub use manager::WindowManager;
pub use options::{WebPreferences, WebPreferencesOverrides, WindowOptions, WindowOverrides};
pub use surface::{CloseObserver, Surface, SurfaceFactory};
