//! One-shot result fetch.
//!
//! At most one result fetch is ever in flight or completed per `Completed`
//! transition. The guard is the `fired` flag, not a phase re-check, so a
//! fast poll tick racing a fast push event cannot double-fetch.

use crate::error::TransportError;
use crate::model::{FinalResult, JobId};
use crate::ports::StatusPort;

/// One-shot guard around [`StatusPort::fetch_result`].
#[derive(Debug, Default)]
pub struct ResultFetcher {
    fired: bool,
}

impl ResultFetcher {
    /// Create an unfired fetcher.
    #[must_use]
    pub const fn new() -> Self {
        Self { fired: false }
    }

    /// Whether the single fetch has already been started.
    #[must_use]
    pub const fn fired(&self) -> bool {
        self.fired
    }

    /// Re-arm after a full engine reset.
    pub const fn reset(&mut self) {
        self.fired = false;
    }

    /// Fetch the final result, exactly once.
    ///
    /// Returns `None` on every call after the first; the fetch outcome of
    /// the first call is `Some`. No internal retries.
    pub async fn fetch_once(
        &mut self,
        port: &dyn StatusPort,
        job: &JobId,
    ) -> Option<Result<FinalResult, TransportError>> {
        if self.fired {
            return None;
        }
        self.fired = true;
        Some(port.fetch_result(job).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::model::{JobStatusKind, JobStatusResponse, ResultStats, YieldPoint};

    struct CountingPort {
        calls: AtomicU32,
    }

    #[async_trait]
    impl StatusPort for CountingPort {
        async fn fetch_status(&self, _job: &JobId) -> Result<JobStatusResponse, TransportError> {
            Ok(JobStatusResponse {
                status: JobStatusKind::Completed,
                progress: None,
                current_return: None,
                yield_points: None,
                message: None,
                reported_at: None,
            })
        }

        async fn fetch_yield_points(
            &self,
            _job: &JobId,
            _page: u32,
            _limit: u32,
        ) -> Result<Vec<YieldPoint>, TransportError> {
            Ok(Vec::new())
        }

        async fn fetch_result(&self, _job: &JobId) -> Result<FinalResult, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FinalResult {
                stats: ResultStats {
                    total_return_percent: 1.0,
                    annualized_return_percent: 1.0,
                    max_drawdown_percent: 0.0,
                    win_rate_percent: 100.0,
                    trade_count: 1,
                },
                yield_points: Vec::new(),
                summary: None,
            })
        }
    }

    #[tokio::test]
    async fn second_call_is_suppressed() {
        let port = CountingPort {
            calls: AtomicU32::new(0),
        };
        let job = JobId::new("bt-1");
        let mut fetcher = ResultFetcher::new();

        assert!(fetcher.fetch_once(&port, &job).await.is_some());
        assert!(fetcher.fetch_once(&port, &job).await.is_none());
        assert_eq!(port.calls.load(Ordering::SeqCst), 1);
        assert!(fetcher.fired());
    }

    #[tokio::test]
    async fn reset_rearms_the_guard() {
        let port = CountingPort {
            calls: AtomicU32::new(0),
        };
        let job = JobId::new("bt-1");
        let mut fetcher = ResultFetcher::new();

        let _ = fetcher.fetch_once(&port, &job).await;
        fetcher.reset();
        let _ = fetcher.fetch_once(&port, &job).await;
        assert_eq!(port.calls.load(Ordering::SeqCst), 2);
    }
}
