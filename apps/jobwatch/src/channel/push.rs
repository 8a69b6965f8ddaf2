//! Push channel task.
//!
//! Wraps one live subscription to a job's updates. Transport-level drops
//! are retried with bounded, jittered backoff; a server-sent terminal event
//! (`completed`/`error`) ends the task and is never retried. Every
//! connection state transition is forwarded so the controller can report
//! channel health.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::reconnect::ReconnectPolicy;
use super::{ChannelUpdate, UpdateKind, UpdateSource};
use crate::config::PushConfig;
use crate::model::{ConnectionState, JobId, PushMessage};
use crate::ports::PushPort;

/// Spawn the push channel task for one session.
///
/// The task exits when `cancel` fires, when the server sends a terminal
/// event, or when the reconnect budget is exhausted. Cancellation is always
/// safe, including while a subscribe call is in flight.
pub(crate) fn spawn(
    job: JobId,
    port: Arc<dyn PushPort>,
    config: PushConfig,
    epoch: u64,
    tx: mpsc::UnboundedSender<ChannelUpdate>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let send = move |kind: UpdateKind| {
            let _ = tx.send(ChannelUpdate {
                epoch,
                source: UpdateSource::Push,
                kind,
            });
        };
        let mut policy = ReconnectPolicy::new(&config);

        loop {
            send(UpdateKind::Connection(ConnectionState::Connecting));

            let subscription = tokio::select! {
                () = cancel.cancelled() => return,
                result = port.subscribe(&job) => result,
            };

            match subscription {
                Ok(mut stream) => {
                    tracing::debug!(job = %job, "push subscription open");
                    send(UpdateKind::Connection(ConnectionState::Connected));
                    policy.reset();

                    loop {
                        let item = tokio::select! {
                            () = cancel.cancelled() => return,
                            item = futures::StreamExt::next(&mut stream) => item,
                        };

                        match item {
                            Some(Ok(PushMessage::Progress(snapshot))) => {
                                send(UpdateKind::Progress(snapshot));
                            }
                            Some(Ok(PushMessage::YieldPoint(point))) => {
                                send(UpdateKind::YieldPoints(vec![point]));
                            }
                            Some(Ok(PushMessage::Completed)) => {
                                tracing::info!(job = %job, "push channel: job completed");
                                send(UpdateKind::Completed);
                                return;
                            }
                            Some(Ok(PushMessage::Error { message })) => {
                                tracing::warn!(job = %job, message = %message, "push channel: job failed");
                                send(UpdateKind::Failed { message });
                                return;
                            }
                            Some(Err(error)) => {
                                tracing::warn!(job = %job, error = %error, "push stream error");
                                break;
                            }
                            None => {
                                tracing::debug!(job = %job, "push stream ended without terminal event");
                                break;
                            }
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(job = %job, error = %error, "push subscribe failed");
                }
            }

            send(UpdateKind::Connection(ConnectionState::Errored));

            let Some(delay) = policy.next_backoff() else {
                tracing::warn!(
                    job = %job,
                    attempts = policy.attempts(),
                    "push reconnect budget exhausted, leaving poll channel in charge"
                );
                send(UpdateKind::Connection(ConnectionState::Disconnected));
                return;
            };

            tracing::debug!(job = %job, delay_ms = delay.as_millis() as u64, "push reconnect scheduled");
            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
        }
    })
}
