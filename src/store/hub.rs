use futures::Stream;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::model::attendance::AttendanceRecord;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub user_id: u64,
    pub records: Arc<Vec<AttendanceRecord>>,
}

/// Fan-out of per-user snapshots to live subscribers.
#[derive(Clone)]
pub struct SnapshotHub {
    tx: broadcast::Sender<Snapshot>,
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SnapshotHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, user_id: u64, records: Vec<AttendanceRecord>) {
        // no receivers is fine
        let _ = self.tx.send(Snapshot {
            user_id,
            records: Arc::new(records),
        });
    }

    pub fn subscribe(&self, user_id: u64) -> Subscription {
        Subscription {
            user_id,
            rx: self.tx.subscribe(),
        }
    }
}

/// Cancellable handle over one user's snapshots. Dropping it unsubscribes.
///
/// Snapshots arrive in publish order. A subscriber that falls behind skips
/// ahead to the newest retained ones.
pub struct Subscription {
    user_id: u64,
    rx: broadcast::Receiver<Snapshot>,
}

impl Subscription {
    pub async fn next(&mut self) -> Option<Arc<Vec<AttendanceRecord>>> {
        loop {
            match self.rx.recv().await {
                Ok(snapshot) if snapshot.user_id == self.user_id => return Some(snapshot.records),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(user_id = self.user_id, skipped, "Subscriber lagged, skipping ahead");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn cancel(self) {}

    pub fn into_stream(self) -> impl Stream<Item = Arc<Vec<AttendanceRecord>>> {
        futures::stream::unfold(self, |mut sub| async move {
            let next = sub.next().await?;
            Some((next, sub))
        })
    }
}
