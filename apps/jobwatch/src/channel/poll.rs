//! Poll channel task.
//!
//! Periodically asks the status endpoint for the same information the push
//! channel streams; this is the availability fallback. A failed request is
//! logged and swallowed; only cancellation or a terminal status stops the
//! task. Supplementary yield-point pages are best-effort extra data and
//! never block progress reporting.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{ChannelUpdate, UpdateKind, UpdateSource};
use crate::config::PollConfig;
use crate::model::{JobId, JobStatusKind, ProgressSnapshot, YieldPoint};
use crate::ports::StatusPort;

/// Spawn the poll channel task for one session.
///
/// Issues a status request immediately, then on the configured interval,
/// until cancelled or a terminal status is observed.
pub(crate) fn spawn(
    job: JobId,
    port: Arc<dyn StatusPort>,
    config: PollConfig,
    epoch: u64,
    tx: mpsc::UnboundedSender<ChannelUpdate>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let send = move |kind: UpdateKind| {
            let _ = tx.send(ChannelUpdate {
                epoch,
                source: UpdateSource::Poll,
                kind,
            });
        };

        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let response = tokio::select! {
                () = cancel.cancelled() => return,
                result = port.fetch_status(&job) => result,
            };

            let response = match response {
                Ok(response) => response,
                Err(error) => {
                    tracing::warn!(job = %job, error = %error, "status poll failed");
                    continue;
                }
            };

            if let Some(percent) = response.progress {
                send(UpdateKind::Progress(ProgressSnapshot {
                    percent,
                    reported_at: response.reported_at.unwrap_or_else(Utc::now),
                }));
            }

            let mut points = response.yield_points.clone().unwrap_or_default();
            if config.max_yield_pages > 0 {
                points.extend(fetch_supplementary(&job, port.as_ref(), &config, &cancel).await);
            }
            if !points.is_empty() {
                send(UpdateKind::YieldPoints(points));
            }

            match response.status {
                JobStatusKind::Completed => {
                    tracing::info!(job = %job, "poll channel: job completed");
                    send(UpdateKind::Completed);
                    return;
                }
                JobStatusKind::Failed => {
                    let message = response
                        .message
                        .unwrap_or_else(|| "job failed".to_string());
                    tracing::warn!(job = %job, message = %message, "poll channel: job failed");
                    send(UpdateKind::Failed { message });
                    return;
                }
                JobStatusKind::Pending | JobStatusKind::Running => {}
            }
        }
    })
}

/// Best-effort paginated fetch of the yield-point sub-resource.
///
/// Any error ends paging for this tick; whatever was collected so far is
/// still merged.
async fn fetch_supplementary(
    job: &JobId,
    port: &dyn StatusPort,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Vec<YieldPoint> {
    let mut collected = Vec::new();

    for page in 0..config.max_yield_pages {
        let batch = tokio::select! {
            () = cancel.cancelled() => break,
            result = port.fetch_yield_points(job, page, config.yield_page_limit) => result,
        };

        match batch {
            Ok(batch) => {
                let last_page = (batch.len() as u32) < config.yield_page_limit;
                collected.extend(batch);
                if last_page {
                    break;
                }
            }
            Err(error) => {
                tracing::debug!(job = %job, page, error = %error, "supplementary yield-point fetch failed");
                break;
            }
        }
    }

    collected
}
