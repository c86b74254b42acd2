//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default window geometry
pub const DEFAULT_WINDOW_WIDTH: u32 = 1200;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 800;
pub const DEFAULT_WINDOW_MIN_WIDTH: u32 = 800;
pub const DEFAULT_WINDOW_MIN_HEIGHT: u32 = 600;

/// Default isolation flags for window content. Overrides can only tighten these.
pub const DEFAULT_NODE_INTEGRATION: bool = false;
pub const DEFAULT_CONTEXT_ISOLATION: bool = true;
pub const DEFAULT_WEB_SECURITY: bool = true;

/// Location of the user config file
pub const DEFAULT_CONFIG_PATH: &str = "~/.usecase-shell/config.json";
