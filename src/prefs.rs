//! Persisted client-side preferences.
//!
//! Simple last-write-wins mirrors of UI state: interface locale, theme,
//! side-panel collapse, and the local todo list. Read once at startup,
//! written whole on every change. Absence or corruption silently falls back
//! to defaults.

use crate::locale::DEFAULT_LOCALE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: u64,
    pub text: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub ui_language: String,
    pub theme: Theme,
    pub panel_collapsed: bool,
    pub todos: Vec<TodoItem>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            ui_language: DEFAULT_LOCALE.to_string(),
            theme: Theme::Light,
            panel_collapsed: false,
            todos: Vec::new(),
        }
    }
}

impl Preferences {
    /// Read preferences from `path`, falling back to defaults on a missing
    /// or corrupt file.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
                debug!("ignoring corrupt preferences file: {}", error);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Write the whole preference file (last write wins).
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("Failed to encode preferences")?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write preferences to {}", path.display()))?;
        Ok(())
    }
}
