//! Shared data vocabulary for the progress engine.
//!
//! Wire types use camelCase field names to match the job-status API.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for one backtest run.
///
/// Immutable for the lifetime of one engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a new job identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A point-in-time progress report from either channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Completion percentage, 0 through 100.
    pub percent: f64,
    /// When the server produced this snapshot.
    pub reported_at: DateTime<Utc>,
}

/// One day's cumulative-return and trade-count sample.
///
/// Uniquely identified by `date` at day granularity; a later message for an
/// existing date overwrites rather than appends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldPoint {
    /// Calendar day this sample covers.
    pub date: NaiveDate,
    /// Cumulative return since the start of the run, in percent.
    pub cumulative_return_percent: f64,
    /// Buy orders executed on this day.
    pub buy_count: u32,
    /// Sell orders executed on this day.
    pub sell_count: u32,
}

/// User-visible lifecycle phase of the watched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Engine constructed, channels not yet opened.
    Idle,
    /// Channels opening; no progress observed yet.
    Connecting,
    /// Progress or yield points observed; job is underway.
    Running,
    /// Terminal: job finished and the final result was fetched.
    Completed,
    /// Terminal: job failed, or the result could not be loaded.
    Failed,
}

impl JobPhase {
    /// Whether this phase is terminal (`Completed` or `Failed`).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check whether a phase transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (Self::Idle, Self::Connecting)
                | (Self::Connecting, Self::Running)
                | (Self::Connecting, Self::Completed)
                | (Self::Connecting, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                // Manual retry re-enters Connecting after a full reset.
                | (Self::Failed, Self::Connecting)
        )
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Per-channel connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and none being attempted.
    Disconnected,
    /// Connection attempt in flight.
    Connecting,
    /// Connected and consuming events.
    Connected,
    /// Last attempt failed; a reconnect may follow.
    Errored,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// Server-reported job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatusKind {
    /// Queued, not yet running.
    Pending,
    /// Computing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl JobStatusKind {
    /// Whether this status is terminal for the job.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Response body of the job-status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    /// Current job status.
    pub status: JobStatusKind,
    /// Completion percentage, if the job reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Cumulative return so far, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_return: Option<f64>,
    /// Yield points embedded in the status response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_points: Option<Vec<YieldPoint>>,
    /// Failure message when `status` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the server produced this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
}

/// Summary statistics of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStats {
    /// Total return over the run, in percent.
    pub total_return_percent: f64,
    /// Annualized return, in percent.
    pub annualized_return_percent: f64,
    /// Maximum drawdown, in percent.
    pub max_drawdown_percent: f64,
    /// Share of closed trades that were profitable, in percent.
    pub win_rate_percent: f64,
    /// Total number of trades executed.
    pub trade_count: u32,
}

/// Finalized result of a completed job.
///
/// Fetched once after the `Completed` transition; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalResult {
    /// Summary statistics.
    pub stats: ResultStats,
    /// Full yield-point series for the run.
    pub yield_points: Vec<YieldPoint>,
    /// Narrative summary of the run, if the server produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// One message on the push subscription.
///
/// `completed` and `error` are terminal; the engine stops consuming further
/// events after either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum PushMessage {
    /// Progress update.
    Progress(ProgressSnapshot),
    /// One new or revised yield point.
    YieldPoint(YieldPoint),
    /// Job finished successfully.
    Completed,
    /// Job failed.
    Error {
        /// Server-supplied failure message.
        message: String,
    },
}
