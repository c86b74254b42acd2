//! Configuration module - shell settings
//!
//! - `defaults` - All default constant values
//! - `types` - The [`ShellConfig`] struct and its getters
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::*;
pub use loader::{default_config_path, load_config, read_config};
pub use types::ShellConfig;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
