// src/config.rs
// Configuration for the demo bot binary

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{PalaverError, Result};

/// Bot configuration loaded from an optional TOML file, with environment
/// variables layered on top. Environment always wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Locale stamped onto inbound console messages.
    pub locale: String,
    /// Directory for file-backed conversation state; in-memory when unset.
    pub state_dir: Option<PathBuf>,
    /// Greeting printed when the REPL starts.
    pub greeting: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            locale: crate::activity::DEFAULT_LOCALE.to_string(),
            state_dir: None,
            greeting: "Say anything to start the conversation. /cancel resets, /quit exits."
                .to_string(),
        }
    }
}

impl BotConfig {
    /// Load from a TOML file when one is given, then apply env overrides
    /// (`PALAVER_LOCALE`, `PALAVER_STATE_DIR`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents)
                    .map_err(|e| PalaverError::Config(format!("{}: {e}", path.display())))?
            }
            None => Self::default(),
        };
        config.apply_env();
        debug!(locale = %config.locale, state_dir = ?config.state_dir, "bot config loaded");
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(locale) = read_env("PALAVER_LOCALE") {
            self.locale = locale;
        }
        if let Some(dir) = read_env("PALAVER_STATE_DIR") {
            self.state_dir = Some(PathBuf::from(dir));
        }
    }
}

/// Read a single environment variable, filtering empty values.
fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
