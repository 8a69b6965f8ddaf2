//! Jobwatch binary: watch one backtest job from the terminal.
//!
//! Usage: `jobwatch <job-id>` (or set `JOBWATCH_JOB_ID`).

use std::sync::Arc;

use anyhow::{Context, Result};

use jobwatch::{
    AppConfig, HttpStatusClient, JobId, JobPhase, ProgressEngine, WebSocketPushClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    jobwatch::telemetry::init_telemetry();

    let config = AppConfig::load().context("failed to load configuration")?;
    let job_id = std::env::args()
        .nth(1)
        .or_else(|| config.job_id.clone())
        .context("usage: jobwatch <job-id> (or set JOBWATCH_JOB_ID)")?;
    let job = JobId::new(job_id);

    tracing::info!(job = %job, api = %config.api_base_url, "watching job");

    let status_port = Arc::new(HttpStatusClient::new(&config.api_base_url)?);
    let push_port = Arc::new(WebSocketPushClient::new(&config.stream_base_url));
    let engine = ProgressEngine::start(job, status_port, push_port, config.engine_config());

    let mut view_rx = engine.subscribe();
    loop {
        view_rx
            .changed()
            .await
            .context("engine stopped unexpectedly")?;
        let view = view_rx.borrow_and_update().clone();

        match view.phase {
            JobPhase::Completed => {
                if let Some(result) = &view.result {
                    tracing::info!(
                        total_return = result.stats.total_return_percent,
                        max_drawdown = result.stats.max_drawdown_percent,
                        trades = result.stats.trade_count,
                        days = result.yield_points.len(),
                        "backtest completed"
                    );
                    if let Some(summary) = &result.summary {
                        tracing::info!(summary = %summary, "run summary");
                    }
                }
                break;
            }
            JobPhase::Failed => {
                if let Some(failure) = &view.failure {
                    tracing::error!(reason = %failure, "backtest failed");
                }
                std::process::exit(1);
            }
            _ => {
                tracing::info!(
                    phase = %view.phase,
                    percent = view.percent,
                    points = view.yield_points.len(),
                    elapsed_secs = view.elapsed.as_secs(),
                    remaining_secs = view.estimated_remaining.map(|d| d.as_secs()),
                    stalled = view.stalled,
                    "progress"
                );
            }
        }
    }

    engine.stop();
    Ok(())
}
