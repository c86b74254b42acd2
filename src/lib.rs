//! usecase-shell - control-process core for a multi-window desktop shell
//!
//! Hosts pluggable use-case modules, dispatches enveloped requests between the
//! control process and rendering surfaces, and manages window lifecycles.

pub mod builtins;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod headless;
pub mod logging;
pub mod shell;
pub mod stdin_commands;
pub mod usecase;
pub mod window;
