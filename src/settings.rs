use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::playback::{FeedMode, ReplayConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Persistent replay preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    pub tick_interval_ms: u64,
    pub feed: FeedMode,
    pub history_limit: usize,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: ReplayConfig::ROUTE_REPORT_TICK.as_millis() as u64,
            feed: FeedMode::Route,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl ReplaySettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fleet-replay").join("settings.json"))
    }

    /// Load from the user config directory, falling back to defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Ignoring settings at {}: {:#}", path.display(), e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = serde_json::from_str(&contents).context("Failed to parse settings")?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save to the user config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No config directory on this platform")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Controller configuration for these settings
    pub fn replay_config(&self) -> ReplayConfig {
        ReplayConfig {
            // A zero period would make the clock spin
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
            feed: self.feed,
            history_limit: self.history_limit,
        }
    }
}
