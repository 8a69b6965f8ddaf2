//! Job phase controller and engine handle.
//!
//! One controller task owns every piece of mutable state (phase,
//! accumulator, estimator, watchdog, one-shot fetcher) and consumes both
//! channels through a single update queue, so all merging and estimation
//! run to completion within one message-handling turn. Consumers observe
//! the engine exclusively through the published [`EngineView`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::accumulator::TimeSeriesAccumulator;
use crate::channel::watchdog::UpdateWatchdog;
use crate::channel::{poll, push, ChannelUpdate, UpdateKind, UpdateSource};
use crate::config::EngineConfig;
use crate::error::FailureReason;
use crate::estimator::ProgressEstimator;
use crate::fetcher::ResultFetcher;
use crate::model::{ConnectionState, FinalResult, JobId, JobPhase, YieldPoint};
use crate::ports::{PushPort, StatusPort};

/// Immutable snapshot of engine state published to consumers.
///
/// These fields are the engine's only outputs.
#[derive(Debug, Clone)]
pub struct EngineView {
    /// Current lifecycle phase.
    pub phase: JobPhase,
    /// Applied completion percentage (monotonically non-decreasing).
    pub percent: f64,
    /// Accumulated yield-point series, sorted ascending by date.
    pub yield_points: Arc<[YieldPoint]>,
    /// Time since the first applied snapshot.
    pub elapsed: Duration,
    /// Estimated remaining time, once an estimate exists.
    pub estimated_remaining: Option<Duration>,
    /// Push channel connection state.
    pub push_state: ConnectionState,
    /// Channel that last raised the applied percent.
    pub authoritative: Option<UpdateSource>,
    /// Non-fatal "still trying" indicator: both channels silent past the
    /// configured threshold.
    pub stalled: bool,
    /// Final result, present once `Completed`.
    pub result: Option<Arc<FinalResult>>,
    /// Terminal failure reason, present once `Failed`.
    pub failure: Option<FailureReason>,
}

impl EngineView {
    fn initial() -> Self {
        Self {
            phase: JobPhase::Idle,
            percent: 0.0,
            yield_points: Arc::from([]),
            elapsed: Duration::ZERO,
            estimated_remaining: None,
            push_state: ConnectionState::Disconnected,
            authoritative: None,
            stalled: false,
            result: None,
            failure: None,
        }
    }
}

/// Commands from the engine handle to the controller task.
enum Command {
    Retry,
}

/// Handle to one running progress engine.
///
/// Exactly one engine instance per job per consumer; dropping the handle
/// (or calling [`stop`](Self::stop)) cancels all timers and channel
/// subscriptions, and any response arriving afterwards is discarded
/// silently.
pub struct ProgressEngine {
    view_rx: watch::Receiver<EngineView>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
}

impl ProgressEngine {
    /// Start watching a job: opens the push and poll channels
    /// simultaneously and transitions `Idle -> Connecting`.
    #[must_use]
    pub fn start(
        job: JobId,
        status_port: Arc<dyn StatusPort>,
        push_port: Arc<dyn PushPort>,
        config: EngineConfig,
    ) -> Self {
        let (view_tx, view_rx) = watch::channel(EngineView::initial());
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let controller = JobPhaseController::new(
            job,
            status_port,
            push_port,
            config,
            view_tx,
            cmd_rx,
            shutdown.clone(),
        );
        tokio::spawn(controller.run());

        Self {
            view_rx,
            cmd_tx,
            shutdown,
        }
    }

    /// Current view snapshot.
    #[must_use]
    pub fn view(&self) -> EngineView {
        self.view_rx.borrow().clone()
    }

    /// Subscribe to view updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EngineView> {
        self.view_rx.clone()
    }

    /// Retry after a terminal failure: full reset, then reconnect.
    ///
    /// Ignored in any phase other than `Failed`.
    pub fn retry(&self) {
        let _ = self.cmd_tx.send(Command::Retry);
    }

    /// Stop the engine: cancels all channels and timers. Idempotent.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for ProgressEngine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Event selected by the controller loop.
enum Event {
    Shutdown,
    Command(Command),
    Update(ChannelUpdate),
    Tick,
}

/// The top-level state machine.
struct JobPhaseController {
    job: JobId,
    status_port: Arc<dyn StatusPort>,
    push_port: Arc<dyn PushPort>,
    config: EngineConfig,

    view_tx: watch::Sender<EngineView>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    shutdown: CancellationToken,

    update_tx: mpsc::UnboundedSender<ChannelUpdate>,
    update_rx: mpsc::UnboundedReceiver<ChannelUpdate>,
    /// Cancels the channels of the current session only.
    session: CancellationToken,
    /// Bumped on every (re)connect; updates from older sessions are
    /// dropped.
    epoch: u64,

    phase: JobPhase,
    accumulator: TimeSeriesAccumulator,
    points_cache: Arc<[YieldPoint]>,
    estimator: ProgressEstimator,
    watchdog: UpdateWatchdog,
    fetcher: ResultFetcher,
    push_state: ConnectionState,
    authoritative: Option<UpdateSource>,
    result: Option<Arc<FinalResult>>,
    failure: Option<FailureReason>,
}

impl JobPhaseController {
    fn new(
        job: JobId,
        status_port: Arc<dyn StatusPort>,
        push_port: Arc<dyn PushPort>,
        config: EngineConfig,
        view_tx: watch::Sender<EngineView>,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
        shutdown: CancellationToken,
    ) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let session = shutdown.child_token();
        let stall_threshold = config.stall_threshold;

        Self {
            job,
            status_port,
            push_port,
            config,
            view_tx,
            cmd_rx,
            shutdown,
            update_tx,
            update_rx,
            session,
            epoch: 0,
            phase: JobPhase::Idle,
            accumulator: TimeSeriesAccumulator::new(),
            points_cache: Arc::from([]),
            estimator: ProgressEstimator::new(),
            watchdog: UpdateWatchdog::new(stall_threshold, Instant::now()),
            fetcher: ResultFetcher::new(),
            push_state: ConnectionState::Disconnected,
            authoritative: None,
            result: None,
            failure: None,
        }
    }

    async fn run(mut self) {
        self.open_session(Instant::now());
        self.publish(Instant::now());

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                () = self.shutdown.cancelled() => Event::Shutdown,
                cmd = self.cmd_rx.recv() => cmd.map_or(Event::Shutdown, Event::Command),
                update = self.update_rx.recv() => {
                    // The controller holds a sender, so the queue never closes.
                    update.map_or(Event::Shutdown, Event::Update)
                }
                _ = ticker.tick() => Event::Tick,
            };

            let now = Instant::now();
            match event {
                Event::Shutdown => break,
                Event::Command(Command::Retry) => self.handle_retry(now),
                Event::Update(update) => {
                    if update.epoch == self.epoch {
                        self.apply(update, now).await;
                    }
                }
                Event::Tick => {}
            }
            self.publish(now);
        }

        self.session.cancel();
        tracing::debug!(job = %self.job, "engine stopped");
    }

    /// Full reset and (re)connect: bumps the epoch, clears all bookkeeping
    /// and spawns fresh channel tasks under a new session token.
    fn open_session(&mut self, now: Instant) {
        self.session.cancel();
        self.session = self.shutdown.child_token();
        self.epoch += 1;

        self.accumulator.clear();
        self.points_cache = Arc::from([]);
        self.estimator.reset();
        self.fetcher.reset();
        self.watchdog.reset(now);
        self.result = None;
        self.failure = None;
        self.authoritative = None;
        self.push_state = ConnectionState::Disconnected;
        self.set_phase(JobPhase::Connecting);

        // Dual-channel start: polling covers the gap while the push
        // transport negotiates.
        push::spawn(
            self.job.clone(),
            Arc::clone(&self.push_port),
            self.config.push.clone(),
            self.epoch,
            self.update_tx.clone(),
            self.session.clone(),
        );
        poll::spawn(
            self.job.clone(),
            Arc::clone(&self.status_port),
            self.config.poll.clone(),
            self.epoch,
            self.update_tx.clone(),
            self.session.clone(),
        );
    }

    async fn apply(&mut self, update: ChannelUpdate, now: Instant) {
        match update.kind {
            UpdateKind::Connection(state) => {
                if update.source == UpdateSource::Push && self.push_state != state {
                    tracing::debug!(job = %self.job, state = %state, "push connection state");
                    self.push_state = state;
                }
            }
            UpdateKind::Progress(snapshot) => {
                if self.phase.is_terminal() {
                    return;
                }
                self.watchdog.record(now);
                // Whichever channel last reported newer progress is
                // authoritative for the number shown.
                if snapshot.percent > self.estimator.percent() {
                    self.authoritative = Some(update.source);
                }
                self.estimator.apply(snapshot.percent, now);
                if self.phase == JobPhase::Connecting && snapshot.percent > 0.0 {
                    self.set_phase(JobPhase::Running);
                }
            }
            UpdateKind::YieldPoints(points) => {
                if self.phase.is_terminal() {
                    return;
                }
                self.watchdog.record(now);
                let report = self.accumulator.merge(&points);
                if report.reset {
                    tracing::info!(
                        job = %self.job,
                        batch = points.len(),
                        "yield-point date regression, series restarted"
                    );
                }
                if report.changed() {
                    self.points_cache = Arc::from(self.accumulator.points());
                }
                if self.phase == JobPhase::Connecting {
                    self.set_phase(JobPhase::Running);
                }
            }
            UpdateKind::Completed => self.complete(update.source, now).await,
            UpdateKind::Failed { message } => {
                if self.phase.is_terminal() {
                    return;
                }
                self.session.cancel();
                self.estimator.freeze(now);
                self.failure = Some(FailureReason::JobFailed { message });
                self.set_phase(JobPhase::Failed);
            }
        }
    }

    /// Handle a terminal `completed` signal from either channel.
    async fn complete(&mut self, source: UpdateSource, now: Instant) {
        if self.phase == JobPhase::Failed {
            return;
        }

        // Both channels stop before the result fetch.
        self.session.cancel();

        let outcome = {
            let fetch = self.fetcher.fetch_once(self.status_port.as_ref(), &self.job);
            tokio::select! {
                () = self.shutdown.cancelled() => return,
                outcome = fetch => outcome,
            }
        };

        match outcome {
            // A second completed signal from the other channel: the
            // one-shot guard already fired, nothing to do.
            None => {}
            Some(Ok(result)) => {
                tracing::info!(job = %self.job, source = %source, "job completed, result loaded");
                self.estimator.apply(100.0, now);
                self.estimator.freeze(now);
                self.result = Some(Arc::new(result));
                self.set_phase(JobPhase::Completed);
            }
            Some(Err(error)) => {
                tracing::error!(job = %self.job, error = %error, "result fetch failed after completion");
                self.estimator.freeze(now);
                self.failure = Some(FailureReason::ResultUnavailable {
                    message: error.to_string(),
                });
                self.set_phase(JobPhase::Failed);
            }
        }
    }

    fn handle_retry(&mut self, now: Instant) {
        if self.phase != JobPhase::Failed {
            tracing::debug!(job = %self.job, phase = %self.phase, "retry ignored outside Failed");
            return;
        }
        tracing::info!(job = %self.job, "retrying after failure");
        self.open_session(now);
    }

    fn set_phase(&mut self, to: JobPhase) {
        if self.phase == to {
            return;
        }
        if !JobPhase::is_valid_transition(self.phase, to) {
            tracing::warn!(job = %self.job, from = %self.phase, to = %to, "invalid phase transition ignored");
            return;
        }
        tracing::info!(job = %self.job, from = %self.phase, to = %to, "phase transition");
        self.phase = to;
    }

    fn publish(&self, now: Instant) {
        let stalled = matches!(self.phase, JobPhase::Connecting | JobPhase::Running)
            && self.watchdog.is_stalled(now);

        self.view_tx.send_replace(EngineView {
            phase: self.phase,
            percent: self.estimator.percent(),
            yield_points: Arc::clone(&self.points_cache),
            elapsed: self.estimator.elapsed(now),
            estimated_remaining: self.estimator.estimated_remaining(now),
            push_state: self.push_state,
            authoritative: self.authoritative,
            stalled,
            result: self.result.clone(),
            failure: self.failure.clone(),
        });
    }
}
