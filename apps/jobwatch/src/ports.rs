//! Port definitions for the engine's external collaborators.
//!
//! The engine only ever talks to the job-status API and the push
//! subscription through these traits, so it is testable without sockets.
//! Concrete adapters live in [`crate::transport`].

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::TransportError;
use crate::model::{FinalResult, JobId, JobStatusResponse, PushMessage, YieldPoint};

/// Stream of push messages for one subscribed job.
///
/// Item errors are transport-level drops; the push channel treats them as
/// reconnectable. Terminal semantics live in [`PushMessage`] itself.
pub type PushStream = BoxStream<'static, Result<PushMessage, TransportError>>;

/// Pull-side collaborator: status, supplementary yield points, final result.
#[async_trait]
pub trait StatusPort: Send + Sync {
    /// Fetch the current job status.
    async fn fetch_status(&self, job: &JobId) -> Result<JobStatusResponse, TransportError>;

    /// Fetch one page of the supplementary yield-point sub-resource.
    ///
    /// Purely additive; never required for correctness of progress
    /// reporting.
    async fn fetch_yield_points(
        &self,
        job: &JobId,
        page: u32,
        limit: u32,
    ) -> Result<Vec<YieldPoint>, TransportError>;

    /// Fetch the finalized result of a completed job.
    ///
    /// Single idempotent call; retry policy belongs to the caller.
    async fn fetch_result(&self, job: &JobId) -> Result<FinalResult, TransportError>;
}

/// Push-side collaborator: a live subscription to one job's updates.
#[async_trait]
pub trait PushPort: Send + Sync {
    /// Open a subscription for the given job.
    async fn subscribe(&self, job: &JobId) -> Result<PushStream, TransportError>;
}
