//! Runtime configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or no
//! file at all) is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::TkResult;

/// Default root window title
const DEFAULT_TITLE: &str = "tk";
/// Default root window geometry
const DEFAULT_GEOMETRY: &str = "300x300";
/// Default safety bound on headless event-loop iterations
const DEFAULT_MAX_LOOP_STEPS: u64 = 100_000;

/// Settings applied to the root window on creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Window title
    pub title: String,
    /// Initial geometry (`WIDTHxHEIGHT[+X+Y]`)
    pub geometry: String,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            geometry: DEFAULT_GEOMETRY.to_string(),
        }
    }
}

/// Settings for the in-process headless runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Reported screen width
    pub screen_width: i64,
    /// Reported screen height
    pub screen_height: i64,
    /// Upper bound on callbacks run by a single `vwait`/`update` before it
    /// gives up
    pub max_loop_steps: u64,
    /// Canned answers for modal dialogs, keyed by dialog command
    /// (`tk_messageBox`, `tk_getOpenFile`, ...)
    pub dialog_answers: BTreeMap<String, String>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            max_loop_steps: DEFAULT_MAX_LOOP_STEPS,
            dialog_answers: BTreeMap::new(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TkConfig {
    pub root: RootConfig,
    pub headless: HeadlessConfig,
}

impl TkConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> TkResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> TkResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
