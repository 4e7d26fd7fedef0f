//! Configuration file support
//!
//! Loads engine options from ~/.mdlive.toml (or %USERPROFILE%\.mdlive.toml on Windows)
//!
//! Format: TOML, kebab-case keys, every key optional
//!
//! Example:
//! ```text
//! # mdlive configuration
//! debounce-delay = 300
//! max-lines-for-full-highlight = 1000
//! visible-lines-buffer = 50
//! enable-performance-logging = false
//! max-cache-size = 100
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::DEFAULT_MAX_CACHE_SIZE;
use crate::debounce::DEFAULT_DEBOUNCE_MS;
use crate::error::Result;
use crate::viewport::{DEFAULT_MAX_LINES_FOR_FULL_HIGHLIGHT, DEFAULT_VISIBLE_LINES_BUFFER};

const CONFIG_FILE: &str = ".mdlive.toml";

/// Engine options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineOptions {
    /// Debounce delay in milliseconds
    pub debounce_delay: u64,
    /// Documents with fewer lines are always highlighted in full
    pub max_lines_for_full_highlight: usize,
    /// Lines highlighted beyond each edge of the viewport
    pub visible_lines_buffer: usize,
    /// Log every pass at debug level
    pub enable_performance_logging: bool,
    /// Cached passes kept per engine
    pub max_cache_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            debounce_delay: DEFAULT_DEBOUNCE_MS,
            max_lines_for_full_highlight: DEFAULT_MAX_LINES_FOR_FULL_HIGHLIGHT,
            visible_lines_buffer: DEFAULT_VISIBLE_LINES_BUFFER,
            enable_performance_logging: false,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
        }
    }
}

impl EngineOptions {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(CONFIG_FILE))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(CONFIG_FILE))
        }
    }

    /// Load options from the default location
    ///
    /// A missing file gives the defaults; an unreadable or malformed one
    /// is logged and also gives the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(options) => options,
            Err(e) => {
                warn!(target: "mdlive::config", path = %path.display(), error = %e, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Load options from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let options: EngineOptions = toml::from_str(contents)?;
        Ok(options.clamped())
    }

    /// Save current options to the default location
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let body = toml::to_string(self)?;
        let contents = format!("# mdlive configuration\n# Generated automatically\n\n{body}");
        fs::write(path, contents)?;
        Ok(())
    }

    /// Debounce delay as a duration
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay)
    }

    /// Apply a partial update
    pub fn merge(&mut self, update: &OptionsUpdate) {
        if let Some(delay) = update.debounce_delay {
            self.debounce_delay = delay;
        }
        if let Some(lines) = update.max_lines_for_full_highlight {
            self.max_lines_for_full_highlight = lines;
        }
        if let Some(buffer) = update.visible_lines_buffer {
            self.visible_lines_buffer = buffer;
        }
        if let Some(enabled) = update.enable_performance_logging {
            self.enable_performance_logging = enabled;
        }
        *self = self.clone().clamped();
    }

    fn clamped(mut self) -> Self {
        self.max_lines_for_full_highlight = self.max_lines_for_full_highlight.max(1);
        self.debounce_delay = self.debounce_delay.min(60_000);
        self
    }
}

/// Partial options update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsUpdate {
    pub debounce_delay: Option<u64>,
    pub max_lines_for_full_highlight: Option<usize>,
    pub visible_lines_buffer: Option<usize>,
    pub enable_performance_logging: Option<bool>,
}

impl OptionsUpdate {
    /// Whether the update changes how documents are narrowed to the viewport
    pub fn affects_extraction(&self, current: &EngineOptions) -> bool {
        self.max_lines_for_full_highlight
            .is_some_and(|v| v.max(1) != current.max_lines_for_full_highlight)
            || self
                .visible_lines_buffer
                .is_some_and(|v| v != current.visible_lines_buffer)
    }
}
