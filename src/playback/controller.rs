use crate::core::Position;
use crate::history::{HistoryQuery, HistorySource, Period, TimeRange};
use crate::playback::clock::PlaybackClock;
use crate::playback::session::{Advance, ReplaySession};
use crate::playback::{ReplayConfig, ReplayError, ReplayState};
use crate::render::{RenderSink, ReplaySnapshot};
use chrono::Utc;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// What happened to a history load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched history replaced the session
    Applied { len: usize },
    /// A newer load started while this one was in flight; result discarded
    Superseded,
}

/// State shared between the controller and its clock task
struct Inner {
    session: ReplaySession,
    clock: Option<PlaybackClock>,
    /// Identifies the clock that is allowed to advance the cursor
    clock_epoch: u64,
    /// Identifies the newest load request
    load_generation: u64,
    sink: Box<dyn RenderSink>,
    updates: watch::Sender<ReplaySnapshot>,
    config: ReplayConfig,
    runtime: Handle,
    this: Weak<Mutex<Inner>>,
}

impl Inner {
    fn publish(&mut self) {
        let snapshot = self.session.snapshot(self.config.feed);
        self.sink.render(&snapshot);
        self.updates.send_replace(snapshot);
    }

    /// Keep exactly one clock while playing and none otherwise
    fn sync_clock(&mut self) {
        let playing = self.session.state() == ReplayState::Playing;
        match (playing, self.clock.is_some()) {
            (true, false) => self.start_clock(),
            (false, true) => self.stop_clock(),
            _ => {}
        }
    }

    fn start_clock(&mut self) {
        self.clock_epoch += 1;
        let epoch = self.clock_epoch;
        let this = self.this.clone();

        let clock = PlaybackClock::start(&self.runtime, self.config.tick_interval, move || {
            let Some(shared) = this.upgrade() else {
                return ControlFlow::Break(());
            };
            let mut inner = lock(&shared);
            inner.on_tick(epoch)
        });
        self.clock = Some(clock);
    }

    fn stop_clock(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.stop();
        }
    }

    fn on_tick(&mut self, epoch: u64) -> ControlFlow<()> {
        if epoch != self.clock_epoch || self.clock.is_none() {
            debug!("Dropping tick from retired clock {}", epoch);
            return ControlFlow::Break(());
        }

        match self.session.advance() {
            Advance::Moved => {
                self.publish();
                ControlFlow::Continue(())
            }
            Advance::Ended => {
                info!("Replay reached the last of {} positions", self.session.len());
                self.sync_clock();
                self.publish();
                ControlFlow::Break(())
            }
            Advance::Ignored => {
                self.sync_clock();
                ControlFlow::Break(())
            }
        }
    }

    /// Replace the session, tearing down the clock first
    fn install(&mut self, positions: Vec<Position>) {
        self.stop_clock();
        self.session = ReplaySession::load(positions);
        self.publish();
    }
}

fn lock(shared: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// VCR-style controller replaying one device's position history
///
/// Owns one `ReplaySession` and at most one `PlaybackClock`. Every state or
/// cursor change is rendered to the sink and published to subscribers.
/// All operations except `load` take effect immediately.
pub struct ReplayController {
    shared: Arc<Mutex<Inner>>,
    history: Arc<dyn HistorySource>,
    config: ReplayConfig,
}

impl ReplayController {
    /// Create a controller on the current tokio runtime
    ///
    /// Fails outside a runtime or when the tick interval is zero.
    pub fn new(
        history: Arc<dyn HistorySource>,
        sink: Box<dyn RenderSink>,
        config: ReplayConfig,
    ) -> Result<Self, ReplayError> {
        if config.tick_interval.is_zero() {
            return Err(ReplayError::ZeroTickInterval);
        }
        let runtime = Handle::try_current().map_err(|_| ReplayError::NoRuntime)?;
        let (updates, _) = watch::channel(ReplaySnapshot::idle(config.feed));

        let inner_config = config.clone();
        let shared = Arc::new_cyclic(|this| {
            Mutex::new(Inner {
                session: ReplaySession::idle(),
                clock: None,
                clock_epoch: 0,
                load_generation: 0,
                sink,
                updates,
                config: inner_config,
                runtime,
                this: this.clone(),
            })
        });

        Ok(Self {
            shared,
            history,
            config,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.shared)
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Fetch a device's history and replace the session with it
    ///
    /// The previous session keeps running while the fetch is in flight. If a
    /// newer load (or `dispose`) happens meanwhile, the result is discarded
    /// and `Superseded` is returned. A failed fetch leaves the previous
    /// session as it was and is not retried.
    pub async fn load(&self, device_id: i64, range: TimeRange) -> Result<LoadOutcome, ReplayError> {
        let query = HistoryQuery::new(device_id, range).with_limit(self.config.history_limit);

        let generation = {
            let mut inner = self.lock();
            inner.load_generation += 1;
            inner.load_generation
        };

        info!(
            "Loading device {} history [{} .. {}] from {}",
            device_id,
            range.from(),
            range.to(),
            self.history.name()
        );
        let result = self.history.fetch(&query).await;

        let mut inner = self.lock();
        if inner.load_generation != generation {
            debug!("Discarding superseded history load for device {}", device_id);
            return Ok(LoadOutcome::Superseded);
        }

        let positions = result.map_err(|e| {
            warn!("History load for device {} failed: {}", device_id, e);
            e
        })?;

        let len = positions.len();
        inner.install(positions);
        info!("Loaded {} positions for device {}", len, device_id);
        Ok(LoadOutcome::Applied { len })
    }

    /// Load a report period preset resolved against the current time
    pub async fn load_period(&self, device_id: i64, period: Period) -> Result<LoadOutcome, ReplayError> {
        let range = period.resolve(Utc::now())?;
        self.load(device_id, range).await
    }

    /// Install an already fetched history, superseding any load in flight
    pub fn load_positions(&self, positions: Vec<Position>) {
        let mut inner = self.lock();
        inner.load_generation += 1;
        inner.install(positions);
    }

    fn apply(&self, op: &str, f: impl FnOnce(&mut ReplaySession) -> bool) {
        let mut inner = self.lock();
        if f(&mut inner.session) {
            inner.sync_clock();
            inner.publish();
            debug!("{}: {:?} at {:?}", op, inner.session.state(), inner.session.cursor());
        } else {
            debug!("{} ignored in state {:?}", op, inner.session.state());
        }
    }

    /// Start or resume playback; no-op while playing or at the last position
    pub fn play(&self) {
        self.apply("play", ReplaySession::start);
    }

    /// Stop the clock and keep the cursor; no-op unless playing
    pub fn pause(&self) {
        self.apply("pause", ReplaySession::pause);
    }

    /// Pauses if playing
    pub fn step_forward(&self) {
        self.apply("step_forward", ReplaySession::step_forward);
    }

    /// Pauses if playing
    pub fn step_backward(&self) {
        self.apply("step_backward", ReplaySession::step_backward);
    }

    /// Jump to `index` (clamped); pauses if playing
    pub fn seek(&self, index: i64) {
        self.apply("seek", |session| session.seek(index));
    }

    /// Stop the clock and rewind to the first position
    pub fn reset(&self) {
        self.apply("reset", ReplaySession::reset);
    }

    /// Tear down: stop the clock, drop the session, supersede pending loads
    pub fn dispose(&self) {
        let mut inner = self.lock();
        inner.load_generation += 1;
        inner.stop_clock();
        inner.session = ReplaySession::idle();
        inner.publish();
        info!("Replay disposed");
    }

    pub fn snapshot(&self) -> ReplaySnapshot {
        let inner = self.lock();
        inner.session.snapshot(inner.config.feed)
    }

    /// Observe every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<ReplaySnapshot> {
        self.lock().updates.subscribe()
    }

    pub fn state(&self) -> ReplayState {
        self.lock().session.state()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.lock().session.cursor()
    }

    pub fn len(&self) -> usize {
        self.lock().session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().session.is_empty()
    }

    /// Whether a playback clock is currently alive
    pub fn has_active_clock(&self) -> bool {
        self.lock().clock.as_ref().is_some_and(PlaybackClock::is_running)
    }
}

impl Drop for ReplayController {
    fn drop(&mut self) {
        self.lock().stop_clock();
    }
}
