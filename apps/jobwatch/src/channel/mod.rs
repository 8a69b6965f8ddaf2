//! Update channels feeding the controller.
//!
//! Both channels translate their transport into the same [`ChannelUpdate`]
//! vocabulary and write it to one queue; reconciliation happens in the
//! controller's accumulator and estimator, never in the channels, so the
//! two are safe to run concurrently.

pub mod poll;
pub mod push;
pub mod reconnect;
pub mod watchdog;

use std::fmt;

use crate::model::{ConnectionState, ProgressSnapshot, YieldPoint};

/// Which channel produced an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    /// Live push subscription.
    Push,
    /// Periodic status polling.
    Poll,
}

impl fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Poll => write!(f, "poll"),
        }
    }
}

/// Payload of one channel update.
#[derive(Debug, Clone)]
pub enum UpdateKind {
    /// Progress report.
    Progress(ProgressSnapshot),
    /// Batch of yield points to merge.
    YieldPoints(Vec<YieldPoint>),
    /// Connection state transition (push channel only).
    Connection(ConnectionState),
    /// Terminal: job finished successfully.
    Completed,
    /// Terminal: job failed.
    Failed {
        /// Server-supplied failure message.
        message: String,
    },
}

/// One update on the controller's queue.
///
/// `epoch` identifies the session that produced the update; the controller
/// drops updates from a cancelled session, which is what keeps a disposed
/// engine silent even when an in-flight response lands late.
#[derive(Debug, Clone)]
pub struct ChannelUpdate {
    /// Session counter at spawn time.
    pub epoch: u64,
    /// Producing channel.
    pub source: UpdateSource,
    /// Payload.
    pub kind: UpdateKind,
}
