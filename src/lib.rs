//! Position replay for GPS fleet tracking.
//!
//! A [`ReplayController`](playback::ReplayController) loads one device's
//! position history from a [`HistorySource`](history::HistorySource) and
//! plays it back on a fixed clock, feeding a
//! [`RenderSink`](render::RenderSink) with the current position and the
//! route travelled so far.

pub mod core;
pub mod history;
pub mod input;
pub mod playback;
pub mod render;
pub mod settings;

pub use crate::core::{Position, RouteStats};
pub use history::{FetchError, FileHistory, HistoryQuery, HistorySource, MockHistory, Period, TimeRange};
pub use playback::{FeedMode, LoadOutcome, ReplayConfig, ReplayController, ReplayError, ReplayState};
pub use render::{LogSink, RecordingSink, RenderSink, ReplaySnapshot};
pub use settings::ReplaySettings;
