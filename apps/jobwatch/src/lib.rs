// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::items_after_statements
    )
)]

//! Jobwatch - Job Progress Reconciliation Engine
//!
//! Keeps a consistent, monotonically-advancing view of one long-running,
//! server-side backtest job. Updates arrive over two independent,
//! unreliable channels - a push channel (live WebSocket stream) and a poll
//! channel (periodic status requests) - and are merged without loss,
//! duplication, or regression while a user-visible phase state machine
//! advances `Idle -> Connecting -> Running -> {Completed | Failed}`.
//!
//! # Architecture
//!
//! - [`model`]: shared data vocabulary (snapshots, yield points, phases)
//! - [`ports`]: traits for the status API and push subscription
//! - [`channel`]: push/poll tasks, reconnect backoff, stall watchdog
//! - [`accumulator`]: ordered, deduplicated yield-point series
//! - [`estimator`]: elapsed / estimated-remaining durations
//! - [`fetcher`]: one-shot final-result fetch
//! - [`controller`]: the phase state machine and the `ProgressEngine`
//!   handle consumers hold
//! - [`transport`]: reqwest / tokio-tungstenite adapters
//!
//! All mutable state lives in a single controller task; channels only
//! translate their transport into a shared update vocabulary. Disposing
//! the engine cancels every timer and subscription, and late responses
//! from a cancelled session are discarded silently.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod accumulator;
pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod estimator;
pub mod fetcher;
pub mod model;
pub mod ports;
pub mod telemetry;
pub mod transport;

pub use accumulator::{MergeReport, TimeSeriesAccumulator};
pub use channel::UpdateSource;
pub use config::{AppConfig, EngineConfig, PollConfig, PushConfig};
pub use controller::{EngineView, ProgressEngine};
pub use error::{FailureReason, TransportError};
pub use estimator::ProgressEstimator;
pub use fetcher::ResultFetcher;
pub use model::{
    ConnectionState, FinalResult, JobId, JobPhase, JobStatusKind, JobStatusResponse,
    ProgressSnapshot, PushMessage, ResultStats, YieldPoint,
};
pub use ports::{PushPort, PushStream, StatusPort};
pub use transport::{HttpStatusClient, WebSocketPushClient};
