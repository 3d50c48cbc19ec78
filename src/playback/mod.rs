pub mod clock;
pub mod controller;
pub mod error;
pub mod session;

pub use controller::{LoadOutcome, ReplayController};
pub use error::ReplayError;
pub use session::ReplaySession;

use crate::history::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Replay state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayState {
    /// Nothing loaded
    Idle,
    /// Session loaded, clock stopped
    Loaded,
    Playing,
    Paused,
    /// Cursor reached the last position by playing
    Ended,
}

/// How densely the render sink is fed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Whole travelled route up to the cursor
    #[default]
    Route,
    /// Only the position under the cursor
    Marker,
}

impl FromStr for FeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "route" => Ok(FeedMode::Route),
            "marker" => Ok(FeedMode::Marker),
            _ => Err(format!("unknown feed mode '{}', expected route or marker", s)),
        }
    }
}

/// Replay configuration, fixed for the lifetime of a controller
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Time between two cursor advances while playing
    pub tick_interval: Duration,
    pub feed: FeedMode,
    /// Maximum positions requested per load
    pub history_limit: usize,
}

impl ReplayConfig {
    pub const ROUTE_REPORT_TICK: Duration = Duration::from_millis(1000);
    pub const REPLAY_TICK: Duration = Duration::from_millis(500);

    /// Route report screen: one second per position, full route polyline
    pub fn route_report() -> Self {
        Self {
            tick_interval: Self::ROUTE_REPORT_TICK,
            feed: FeedMode::Route,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Replay screen: faster ticks, single marker
    pub fn replay() -> Self {
        Self {
            tick_interval: Self::REPLAY_TICK,
            feed: FeedMode::Marker,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self::route_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(ReplayConfig::default().tick_interval, Duration::from_secs(1));
        assert_eq!(ReplayConfig::default().history_limit, 5000);
        assert_eq!(ReplayConfig::replay().tick_interval, Duration::from_millis(500));
        assert_eq!(ReplayConfig::replay().feed, FeedMode::Marker);
    }

    #[test]
    fn test_feed_mode_parse() {
        assert_eq!("Route".parse::<FeedMode>(), Ok(FeedMode::Route));
        assert_eq!("marker".parse::<FeedMode>(), Ok(FeedMode::Marker));
        assert!("polyline".parse::<FeedMode>().is_err());
    }
}
