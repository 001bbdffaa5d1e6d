//! Location updates flow one way: producers publish immutable events on a
//! broadcast channel, the monitor task folds them into a status board that
//! readers query. Nobody holds a reference into anyone else's state.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{model::geo::Coordinate, service::AttendanceService};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationEvent {
    pub user_id: u64,
    pub position: Coordinate,
    pub recorded_at: DateTime<Utc>,
}

/// Publishing side of the location channel.
#[derive(Clone)]
pub struct LocationHub {
    tx: broadcast::Sender<LocationEvent>,
}

impl Default for LocationHub {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl LocationHub {
    /// Returns how many subscribers saw the event.
    pub fn publish(&self, event: LocationEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct GeofenceStatus {
    pub position: Coordinate,
    pub distance_m: f64,
    pub limit_m: f64,
    pub within: bool,
    #[schema(value_type = String, format = "date-time")]
    pub recorded_at: DateTime<Utc>,
}

/// Latest geofence status per user. Stale entries age out.
#[derive(Clone)]
pub struct StatusBoard {
    statuses: Cache<u64, GeofenceStatus>,
}

impl StatusBoard {
    pub fn new(max_users: u64, ttl: Duration) -> Self {
        Self {
            statuses: Cache::builder()
                .max_capacity(max_users)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, user_id: u64) -> Option<GeofenceStatus> {
        self.statuses.get(&user_id).await
    }

    async fn put(&self, user_id: u64, status: GeofenceStatus) {
        self.statuses.insert(user_id, status).await;
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new(100_000, Duration::from_secs(6 * 3600))
    }
}

/// Evaluate one event. Events older than what the board holds are dropped.
pub async fn apply_event(service: &AttendanceService, board: &StatusBoard, event: LocationEvent) {
    if let Some(current) = board.get(event.user_id).await {
        if current.recorded_at > event.recorded_at {
            debug!(user_id = event.user_id, "Dropping out-of-order location event");
            return;
        }
    }

    match service.check_position(event.position).await {
        Ok(check) => {
            board
                .put(
                    event.user_id,
                    GeofenceStatus {
                        position: event.position,
                        distance_m: check.distance_m,
                        limit_m: check.limit_m,
                        within: check.within,
                        recorded_at: event.recorded_at,
                    },
                )
                .await;
        }
        Err(e) => warn!(error = %e, user_id = event.user_id, "Location event rejected"),
    }
}

/// Consume location events until the hub is dropped.
pub async fn run_monitor(
    mut rx: broadcast::Receiver<LocationEvent>,
    service: AttendanceService,
    board: StatusBoard,
) {
    info!("Geofence monitor started");
    loop {
        match rx.recv().await {
            Ok(event) => apply_event(&service, &board, event).await,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Geofence monitor lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    info!("Geofence monitor stopped");
}
