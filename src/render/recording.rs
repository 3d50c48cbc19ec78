use crate::render::{RenderSink, ReplaySnapshot};
use std::sync::{Arc, Mutex};

/// Render sink that keeps every frame it receives
///
/// Clones share the same buffer, so a test can hand one clone to the
/// controller and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<ReplaySnapshot>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded frames
    pub fn frames(&self) -> Vec<ReplaySnapshot> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Cursor of every recorded frame
    pub fn cursors(&self) -> Vec<Option<usize>> {
        self.frames().iter().map(|f| f.cursor).collect()
    }

    pub fn last(&self) -> Option<ReplaySnapshot> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }
}

impl RenderSink for RecordingSink {
    fn render(&mut self, snapshot: &ReplaySnapshot) {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(snapshot.clone());
    }
}
