use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;

use super::{AttendanceStore, SnapshotHub, Subscription, sort_newest_first};
use crate::{
    clock::Clock,
    error::AbsenError,
    model::{
        attendance::{AttendanceRecord, AttendanceType, NewAttendance, RecordId},
        geo::GeofenceSettings,
        schedule::ScheduleEntry,
    },
};

#[derive(Default)]
struct Collections {
    attendance: BTreeMap<RecordId, AttendanceRecord>,
    schedule: BTreeMap<String, ScheduleEntry>,
    geofence: Option<GeofenceSettings>,
    next_id: RecordId,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Collections {
    fn user_records(&self, user_id: u64) -> Vec<AttendanceRecord> {
        let mut records: Vec<_> = self
            .attendance
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        records
    }

    /// Clock time, bumped so timestamps strictly increase per write.
    fn stamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

/// Process-local store. Timestamps come from the injected clock.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    inner: RwLock<Collections>,
    hub: SnapshotHub,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(Collections::default()),
            hub: SnapshotHub::default(),
        }
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn query_by_user_and_type(
        &self,
        user_id: u64,
        kind: AttendanceType,
    ) -> Result<Vec<AttendanceRecord>, AbsenError> {
        let inner = self.inner.read().await;
        Ok(inner
            .user_records(user_id)
            .into_iter()
            .filter(|r| r.kind == kind)
            .collect())
    }

    async fn list_by_user(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, AbsenError> {
        Ok(self.inner.read().await.user_records(user_id))
    }

    async fn get(&self, id: RecordId) -> Result<Option<AttendanceRecord>, AbsenError> {
        Ok(self.inner.read().await.attendance.get(&id).cloned())
    }

    async fn insert(&self, record: NewAttendance) -> Result<RecordId, AbsenError> {
        let (id, snapshot) = {
            let mut inner = self.inner.write().await;
            inner.next_id += 1;
            let id = inner.next_id;
            let timestamp = inner.stamp(self.clock.now());

            inner.attendance.insert(
                id,
                AttendanceRecord {
                    id,
                    user_id: record.user_id,
                    display_name: record.display_name,
                    timestamp,
                    kind: record.kind,
                    photo: record.photo,
                    time_note: record.time_note,
                },
            );
            (id, inner.user_records(record.user_id))
        };

        self.hub.publish(record.user_id, snapshot);
        Ok(id)
    }

    async fn delete(&self, id: RecordId) -> Result<(), AbsenError> {
        let changed = {
            let mut inner = self.inner.write().await;
            inner
                .attendance
                .remove(&id)
                .map(|removed| (removed.user_id, inner.user_records(removed.user_id)))
        };

        if let Some((user_id, snapshot)) = changed {
            self.hub.publish(user_id, snapshot);
        }
        Ok(())
    }

    fn subscribe(&self, user_id: u64) -> Subscription {
        self.hub.subscribe(user_id)
    }

    async fn query_schedule_by_weekday(&self, day: &str) -> Result<Option<ScheduleEntry>, AbsenError> {
        Ok(self.inner.read().await.schedule.get(day).cloned())
    }

    async fn list_schedules(&self) -> Result<Vec<ScheduleEntry>, AbsenError> {
        Ok(self.inner.read().await.schedule.values().cloned().collect())
    }

    async fn upsert_schedule(&self, entry: &ScheduleEntry) -> Result<(), AbsenError> {
        self.inner
            .write()
            .await
            .schedule
            .insert(entry.day.clone(), entry.clone());
        Ok(())
    }

    async fn geofence(&self) -> Result<Option<GeofenceSettings>, AbsenError> {
        Ok(self.inner.read().await.geofence)
    }

    async fn set_geofence(&self, settings: &GeofenceSettings) -> Result<(), AbsenError> {
        self.inner.write().await.geofence = Some(*settings);
        Ok(())
    }
}
