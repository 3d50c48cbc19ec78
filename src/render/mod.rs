pub mod log;
pub mod recording;

pub use self::log::LogSink;
pub use recording::RecordingSink;

use crate::core::{Position, RouteStats};
use crate::playback::{FeedMode, ReplayState};
use std::sync::Arc;

/// Read-only view of a replay handed to sinks and subscribers
///
/// Shares the session's immutable position buffer; nothing in here can
/// change playback.
#[derive(Debug, Clone)]
pub struct ReplaySnapshot {
    pub state: ReplayState,
    /// Index of the displayed position, `None` when nothing is loaded
    pub cursor: Option<usize>,
    pub feed: FeedMode,
    positions: Arc<[Position]>,
}

impl ReplaySnapshot {
    pub(crate) fn new(state: ReplayState, cursor: Option<usize>, feed: FeedMode, positions: Arc<[Position]>) -> Self {
        Self {
            state,
            cursor,
            feed,
            positions,
        }
    }

    /// Snapshot of a controller with nothing loaded
    pub fn idle(feed: FeedMode) -> Self {
        Self::new(ReplayState::Idle, None, feed, Arc::from(Vec::new()))
    }

    /// Number of positions in the session
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position under the cursor
    pub fn current(&self) -> Option<&Position> {
        self.cursor.and_then(|i| self.positions.get(i))
    }

    /// Positions to draw for this frame
    ///
    /// `Route` feeds the whole travelled prefix up to and including the
    /// cursor; `Marker` feeds only the current position.
    pub fn played(&self) -> &[Position] {
        match (self.cursor, self.feed) {
            (None, _) => &[],
            (Some(i), FeedMode::Route) => &self.positions[..=i],
            (Some(i), FeedMode::Marker) => &self.positions[i..=i],
        }
    }

    /// Statistics of the route travelled so far
    pub fn route_stats(&self) -> RouteStats {
        match self.cursor {
            Some(i) => RouteStats::from_positions(&self.positions[..=i]),
            None => RouteStats::default(),
        }
    }

    /// Playback progress in `[0.0, 1.0]`
    pub fn progress(&self) -> f32 {
        match self.cursor {
            Some(i) if self.len() > 1 => i as f32 / (self.len() - 1) as f32,
            Some(_) => 1.0,
            None => 0.0,
        }
    }
}

/// Consumer that draws the replay (map marker and route polyline)
///
/// Called after every state or cursor change. Sinks only read the snapshot
/// and must not call back into the controller.
pub trait RenderSink: Send {
    fn render(&mut self, snapshot: &ReplaySnapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn positions(n: usize) -> Arc<[Position]> {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        (0..n)
            .map(|i| Position::new(i as i64, 1, t0 + Duration::seconds(i as i64), 0.0, i as f64 * 0.01))
            .collect()
    }

    #[test]
    fn test_route_feed_includes_cursor() {
        let snap = ReplaySnapshot::new(ReplayState::Paused, Some(2), FeedMode::Route, positions(5));
        let ids: Vec<i64> = snap.played().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(snap.current().map(|p| p.id), Some(2));
        assert_eq!(snap.progress(), 0.5);
    }

    #[test]
    fn test_marker_feed_is_single_point() {
        let snap = ReplaySnapshot::new(ReplayState::Playing, Some(3), FeedMode::Marker, positions(5));
        let ids: Vec<i64> = snap.played().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3]);
        // Travelled distance still covers the whole prefix
        assert_eq!(snap.route_stats().points, 4);
    }

    #[test]
    fn test_idle_snapshot() {
        let snap = ReplaySnapshot::idle(FeedMode::Route);
        assert!(snap.is_empty());
        assert!(snap.current().is_none());
        assert!(snap.played().is_empty());
        assert_eq!(snap.progress(), 0.0);
    }
}
