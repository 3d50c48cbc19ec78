use std::ops::ControlFlow;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Periodic playback clock
///
/// Owns a spawned task that calls `on_tick` once per period, first after one
/// full period. Ticks run one after another inside that task and never
/// overlap. The task ends when `on_tick` breaks, when `stop` is called, or
/// when the clock is dropped.
#[derive(Debug)]
pub struct PlaybackClock {
    handle: JoinHandle<()>,
}

impl PlaybackClock {
    pub fn start<F>(runtime: &Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        debug!("Starting playback clock ({:?})", period);

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });

        Self { handle }
    }

    /// Whether the clock task is still alive
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the clock; no tick fires after this returns
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        debug!("Stopping playback clock");
        self.handle.abort();
    }
}
