use crate::core::Position;
use crate::playback::{FeedMode, ReplayState};
use crate::render::ReplaySnapshot;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one clock tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Cursor moved, still playing
    Moved,
    /// Cursor reached the last position
    Ended,
    /// Not playing, nothing changed
    Ignored,
}

/// One loaded batch of positions plus the playback cursor
///
/// Positions never change after loading; reloading builds a new session.
/// All transitions are synchronous. Clock ownership lives in the controller.
#[derive(Debug, Clone)]
pub struct ReplaySession {
    positions: Arc<[Position]>,
    cursor: usize,
    state: ReplayState,
}

impl Default for ReplaySession {
    fn default() -> Self {
        Self::idle()
    }
}

impl ReplaySession {
    /// Session with nothing loaded
    pub fn idle() -> Self {
        Self {
            positions: Arc::from(Vec::new()),
            cursor: 0,
            state: ReplayState::Idle,
        }
    }

    /// Session over a loaded history, cursor on the first position
    pub fn load(mut positions: Vec<Position>) -> Self {
        if positions.windows(2).any(|w| w[0].server_time > w[1].server_time) {
            warn!("History of {} positions is not ordered by server time, sorting", positions.len());
            positions.sort_by_key(|p| p.server_time);
        }

        Self {
            positions: positions.into(),
            cursor: 0,
            state: ReplayState::Loaded,
        }
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    /// Current cursor, `None` when the session is empty
    pub fn cursor(&self) -> Option<usize> {
        (!self.positions.is_empty()).then_some(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn current(&self) -> Option<&Position> {
        self.positions.get(self.cursor)
    }

    fn last_index(&self) -> Option<usize> {
        self.positions.len().checked_sub(1)
    }

    /// Whether `start` would begin playing
    pub fn can_play(&self) -> bool {
        matches!(self.state, ReplayState::Loaded | ReplayState::Paused)
            && self.last_index().is_some_and(|last| self.cursor < last)
    }

    /// Enter `Playing`, returns false when already playing or nothing is left to play
    pub fn start(&mut self) -> bool {
        if !self.can_play() {
            return false;
        }
        self.state = ReplayState::Playing;
        true
    }

    /// Leave `Playing` for `Paused`, no-op in any other state
    pub fn pause(&mut self) -> bool {
        if self.state != ReplayState::Playing {
            return false;
        }
        self.state = ReplayState::Paused;
        true
    }

    /// Advance one position on a clock tick
    pub fn advance(&mut self) -> Advance {
        if self.state != ReplayState::Playing {
            return Advance::Ignored;
        }
        let Some(last) = self.last_index() else {
            self.state = ReplayState::Loaded;
            return Advance::Ignored;
        };

        self.cursor = (self.cursor + 1).min(last);
        if self.cursor == last {
            self.state = ReplayState::Ended;
            Advance::Ended
        } else {
            Advance::Moved
        }
    }

    /// Jump to `index`, clamped into `[0, N-1]`
    ///
    /// Seeking while playing pauses first. Seeking away from the end of an
    /// ended replay pauses it.
    pub fn seek(&mut self, index: i64) -> bool {
        let Some(last) = self.last_index() else {
            return false;
        };
        let target = index.clamp(0, last as i64) as usize;
        if target as i64 != index {
            debug!("Seek to {} clamped to {}", index, target);
        }
        self.move_to(target)
    }

    /// Move one position forward, stops at the last position
    pub fn step_forward(&mut self) -> bool {
        let Some(last) = self.last_index() else {
            return false;
        };
        self.move_to((self.cursor + 1).min(last))
    }

    /// Move one position back, stops at the first position
    pub fn step_backward(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.move_to(self.cursor.saturating_sub(1))
    }

    fn move_to(&mut self, target: usize) -> bool {
        let paused = self.pause();

        if target == self.cursor {
            return paused;
        }

        self.cursor = target;
        if self.state == ReplayState::Ended {
            self.state = ReplayState::Paused;
        }
        true
    }

    /// Back to the first position with the clock stopped
    pub fn reset(&mut self) -> bool {
        if self.state == ReplayState::Idle {
            return false;
        }
        let changed = self.cursor != 0 || self.state != ReplayState::Loaded;
        self.cursor = 0;
        self.state = ReplayState::Loaded;
        changed
    }

    /// Read-only view for render sinks
    pub fn snapshot(&self, feed: FeedMode) -> ReplaySnapshot {
        ReplaySnapshot::new(self.state, self.cursor(), feed, self.positions.clone())
    }
}
