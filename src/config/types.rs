//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::logging;
use crate::window::{WindowOptions, WindowOverrides};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellConfig {
    /// Window defaults applied before per-window overrides.
    /// Isolation flags here can tighten the built-in defaults but never loosen them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowOverrides>,
    /// Directory for the JSONL log (default: ~/.usecase-shell/logs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
    /// Use-case ids that should not be registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_use_cases: Option<Vec<String>>,
}

impl ShellConfig {
    /// Resolved window defaults
    pub fn get_window_options(&self) -> WindowOptions {
        match &self.window {
            Some(window) => WindowOptions::default().merged(window),
            None => WindowOptions::default(),
        }
    }

    /// Log directory with `~` expanded, or the default location
    pub fn get_log_dir(&self) -> PathBuf {
        self.log_dir
            .as_deref()
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
            .unwrap_or_else(logging::default_log_dir)
    }

    pub fn is_use_case_enabled(&self, id: &str) -> bool {
        self.disabled_use_cases
            .as_ref()
            .map(|disabled| !disabled.iter().any(|d| d == id))
            .unwrap_or(true)
    }
}
