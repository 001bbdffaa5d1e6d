//! Attendance Store Client: the document-store contract the engine relies on.

pub mod hub;
pub mod memory;
pub mod mysql;

use async_trait::async_trait;

use crate::{
    error::AbsenError,
    model::{
        attendance::{AttendanceRecord, AttendanceType, NewAttendance, RecordId},
        geo::GeofenceSettings,
        schedule::ScheduleEntry,
    },
};

pub use hub::{SnapshotHub, Subscription};
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// All records of one type for a user. No date filter; callers pick the
    /// calendar day themselves.
    async fn query_by_user_and_type(
        &self,
        user_id: u64,
        kind: AttendanceType,
    ) -> Result<Vec<AttendanceRecord>, AbsenError>;

    /// A user's full history, newest first.
    async fn list_by_user(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, AbsenError>;

    async fn get(&self, id: RecordId) -> Result<Option<AttendanceRecord>, AbsenError>;

    async fn insert(&self, record: NewAttendance) -> Result<RecordId, AbsenError>;

    /// Deleting a missing record is not an error.
    async fn delete(&self, id: RecordId) -> Result<(), AbsenError>;

    /// Live snapshots of a user's records, pushed after every write that
    /// touches them.
    fn subscribe(&self, user_id: u64) -> Subscription;

    async fn query_schedule_by_weekday(&self, day: &str) -> Result<Option<ScheduleEntry>, AbsenError>;

    async fn list_schedules(&self) -> Result<Vec<ScheduleEntry>, AbsenError>;

    async fn upsert_schedule(&self, entry: &ScheduleEntry) -> Result<(), AbsenError>;

    async fn geofence(&self) -> Result<Option<GeofenceSettings>, AbsenError>;

    async fn set_geofence(&self, settings: &GeofenceSettings) -> Result<(), AbsenError>;
}

/// Newest first, ties broken by id.
pub(crate) fn sort_newest_first(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}
