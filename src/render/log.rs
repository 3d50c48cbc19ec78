use crate::playback::ReplayState;
use crate::render::{RenderSink, ReplaySnapshot};
use tracing::info;

/// Render sink that writes one log line per frame
#[derive(Debug, Default)]
pub struct LogSink {
    frames: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSink for LogSink {
    fn render(&mut self, snapshot: &ReplaySnapshot) {
        self.frames += 1;

        let (Some(cursor), Some(position)) = (snapshot.cursor, snapshot.current()) else {
            match snapshot.state {
                ReplayState::Idle => info!("[{:?}] nothing loaded", snapshot.state),
                _ => info!("[{:?}] no positions in range", snapshot.state),
            }
            return;
        };

        let stats = snapshot.route_stats();
        info!(
            "[{:?}] {}/{} {} ({:.5}, {:.5}) {} travelled {:.2} km",
            snapshot.state,
            cursor + 1,
            snapshot.len(),
            position.fix_or_server_time().format("%Y-%m-%d %H:%M:%S"),
            position.latitude,
            position.longitude,
            position
                .speed_kmh()
                .map(|kmh| format!("{:.1} km/h", kmh))
                .unwrap_or_else(|| "-".to_string()),
            stats.distance_km(),
        );

        if snapshot.state == ReplayState::Ended {
            info!("Route complete: {}", stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::FeedMode;

    #[test]
    fn test_counts_frames() {
        let mut sink = LogSink::new();
        sink.render(&ReplaySnapshot::idle(FeedMode::Route));
        sink.render(&ReplaySnapshot::idle(FeedMode::Marker));
        assert_eq!(sink.frames(), 2);
    }
}
