use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

use crate::clock::Clock;

pub type Job = BoxFuture<'static, ()>;

/// Run a job at (or right after) a point in time.
pub trait JobScheduler: Send + Sync {
    fn schedule_at(&self, at: DateTime<Utc>, job: Job) -> JobHandle;
}

/// Handle to a scheduled job. Dropping it does not cancel the job.
pub struct JobHandle {
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the job; `false` if it was cancelled.
    pub async fn join(self) -> bool {
        self.task.await.is_ok()
    }
}

/// Sleeps on the tokio timer. Instants already in the past run immediately.
pub struct TokioJobScheduler {
    clock: Arc<dyn Clock>,
}

impl TokioJobScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl JobScheduler for TokioJobScheduler {
    fn schedule_at(&self, at: DateTime<Utc>, job: Job) -> JobHandle {
        let delay = (at - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(%at, delay_secs = delay.as_secs(), "Scheduling job");

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        });
        JobHandle { task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scheduler() -> TokioJobScheduler {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()));
        TokioJobScheduler::new(clock)
    }

    #[tokio::test]
    async fn past_instant_runs_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let handle = scheduler().schedule_at(
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(handle.join().await);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn future_instant_waits_and_can_be_cancelled() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let handle = scheduler().schedule_at(
            Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap(),
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!handle.is_finished());

        handle.cancel();
        assert!(!handle.join().await);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
