//! Window creation options and the merge rules for caller overrides.
//!
//! Sizes are plain overrides. Isolation flags in [`WebPreferences`] may only be
//! tightened: a request to enable node integration, or to disable context
//! isolation or web security, is dropped and logged.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{
    DEFAULT_CONTEXT_ISOLATION, DEFAULT_NODE_INTEGRATION, DEFAULT_WEB_SECURITY,
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_MIN_HEIGHT, DEFAULT_WINDOW_MIN_WIDTH,
    DEFAULT_WINDOW_WIDTH,
};

/// Isolation settings for the content of a rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPreferences {
    pub node_integration: bool,
    pub context_isolation: bool,
    pub web_security: bool,
}

impl Default for WebPreferences {
    fn default() -> Self {
        WebPreferences {
            node_integration: DEFAULT_NODE_INTEGRATION,
            context_isolation: DEFAULT_CONTEXT_ISOLATION,
            web_security: DEFAULT_WEB_SECURITY,
        }
    }
}

/// Requested isolation flags; `None` keeps the base value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPreferencesOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_integration: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_isolation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_security: Option<bool>,
}

impl WebPreferences {
    /// Apply `requested` on top of `self`, accepting only changes that tighten isolation.
    pub fn tightened(&self, requested: &WebPreferencesOverrides) -> WebPreferences {
        let mut merged = *self;

        if let Some(node_integration) = requested.node_integration {
            if node_integration && !self.node_integration {
                warn!(flag = "nodeIntegration", "Ignoring override that weakens window isolation");
            } else {
                merged.node_integration = node_integration;
            }
        }
        if let Some(context_isolation) = requested.context_isolation {
            if !context_isolation && self.context_isolation {
                warn!(flag = "contextIsolation", "Ignoring override that weakens window isolation");
            } else {
                merged.context_isolation = context_isolation;
            }
        }
        if let Some(web_security) = requested.web_security {
            if !web_security && self.web_security {
                warn!(flag = "webSecurity", "Ignoring override that weakens window isolation");
            } else {
                merged.web_security = web_security;
            }
        }

        merged
    }
}

/// Fully resolved options handed to the surface factory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowOptions {
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub web_preferences: WebPreferences,
}

impl Default for WindowOptions {
    fn default() -> Self {
        WindowOptions {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            min_width: DEFAULT_WINDOW_MIN_WIDTH,
            min_height: DEFAULT_WINDOW_MIN_HEIGHT,
            title: None,
            web_preferences: WebPreferences::default(),
        }
    }
}

/// Caller-supplied options; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_preferences: Option<WebPreferencesOverrides>,
}

impl WindowOverrides {
    pub fn with_size(width: u32, height: u32) -> Self {
        WindowOverrides {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        WindowOverrides {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

impl WindowOptions {
    /// Merge `overrides` over these options.
    pub fn merged(&self, overrides: &WindowOverrides) -> WindowOptions {
        let web_preferences = match &overrides.web_preferences {
            Some(requested) => self.web_preferences.tightened(requested),
            None => self.web_preferences,
        };

        WindowOptions {
            width: overrides.width.unwrap_or(self.width),
            height: overrides.height.unwrap_or(self.height),
            min_width: overrides.min_width.unwrap_or(self.min_width),
            min_height: overrides.min_height.unwrap_or(self.min_height),
            title: overrides.title.clone().or_else(|| self.title.clone()),
            web_preferences,
        }
    }
}
