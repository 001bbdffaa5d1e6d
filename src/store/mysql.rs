use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use sqlx::{FromRow, MySqlPool};
use std::str::FromStr;

use super::{AttendanceStore, SnapshotHub, Subscription};
use crate::{
    error::AbsenError,
    model::{
        attendance::{AttendanceRecord, AttendanceType, NewAttendance, RecordId},
        geo::{Coordinate, GeofenceSettings},
        schedule::ScheduleEntry,
    },
};

const SELECT_ATTENDANCE: &str = r#"
SELECT id, uid, name, `timestamp` AS stamped_at, type AS kind, photo, time_note
FROM attendance
"#;

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    uid: u64,
    name: String,
    stamped_at: NaiveDateTime,
    kind: String,
    photo: Vec<u8>,
    time_note: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AbsenError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let kind = AttendanceType::from_str(&row.kind)
            .map_err(|_| AbsenError::Read(format!("unknown attendance type {:?} on record {}", row.kind, row.id)))?;

        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.uid,
            display_name: row.name,
            timestamp: Utc.from_utc_datetime(&row.stamped_at),
            kind,
            photo: row.photo,
            time_note: row.time_note,
        })
    }
}

fn into_records(rows: Vec<AttendanceRow>) -> Result<Vec<AttendanceRecord>, AbsenError> {
    rows.into_iter().map(AttendanceRecord::try_from).collect()
}

/// MySQL-backed store. Timestamps are assigned by the database in UTC.
pub struct MySqlStore {
    pool: MySqlPool,
    hub: SnapshotHub,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            hub: SnapshotHub::default(),
        }
    }

    /// Push the user's current list to subscribers. A failed re-read only
    /// costs a snapshot, never the write that triggered it.
    async fn publish_for(&self, user_id: u64) {
        match self.list_by_user(user_id).await {
            Ok(records) => self.hub.publish(user_id, records),
            Err(e) => tracing::warn!(error = %e, user_id, "Snapshot refresh failed"),
        }
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn query_by_user_and_type(
        &self,
        user_id: u64,
        kind: AttendanceType,
    ) -> Result<Vec<AttendanceRecord>, AbsenError> {
        let sql = format!("{SELECT_ATTENDANCE} WHERE uid = ? AND type = ? ORDER BY `timestamp` DESC, id DESC");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(kind.as_ref())
            .fetch_all(&self.pool)
            .await
            .map_err(AbsenError::read)?;
        into_records(rows)
    }

    async fn list_by_user(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, AbsenError> {
        let sql = format!("{SELECT_ATTENDANCE} WHERE uid = ? ORDER BY `timestamp` DESC, id DESC");
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AbsenError::read)?;
        into_records(rows)
    }

    async fn get(&self, id: RecordId) -> Result<Option<AttendanceRecord>, AbsenError> {
        let sql = format!("{SELECT_ATTENDANCE} WHERE id = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AbsenError::read)?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn insert(&self, record: NewAttendance) -> Result<RecordId, AbsenError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (uid, name, `timestamp`, type, photo, time_note)
            VALUES (?, ?, UTC_TIMESTAMP(3), ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(&record.display_name)
        .bind(record.kind.as_ref())
        .bind(&record.photo)
        .bind(&record.time_note)
        .execute(&self.pool)
        .await
        .map_err(AbsenError::write)?;

        self.publish_for(record.user_id).await;
        Ok(result.last_insert_id())
    }

    async fn delete(&self, id: RecordId) -> Result<(), AbsenError> {
        let owner: Option<u64> = sqlx::query_scalar("SELECT uid FROM attendance WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AbsenError::read)?;

        let Some(user_id) = owner else {
            return Ok(());
        };

        sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AbsenError::write)?;

        self.publish_for(user_id).await;
        Ok(())
    }

    fn subscribe(&self, user_id: u64) -> Subscription {
        self.hub.subscribe(user_id)
    }

    async fn query_schedule_by_weekday(&self, day: &str) -> Result<Option<ScheduleEntry>, AbsenError> {
        sqlx::query_as::<_, ScheduleEntry>("SELECT day, entry_time, exit_time FROM schedule WHERE day = ?")
            .bind(day)
            .fetch_optional(&self.pool)
            .await
            .map_err(AbsenError::read)
    }

    async fn list_schedules(&self) -> Result<Vec<ScheduleEntry>, AbsenError> {
        sqlx::query_as::<_, ScheduleEntry>("SELECT day, entry_time, exit_time FROM schedule")
            .fetch_all(&self.pool)
            .await
            .map_err(AbsenError::read)
    }

    async fn upsert_schedule(&self, entry: &ScheduleEntry) -> Result<(), AbsenError> {
        sqlx::query(
            r#"
            INSERT INTO schedule (day, entry_time, exit_time)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE entry_time = VALUES(entry_time), exit_time = VALUES(exit_time)
            "#,
        )
        .bind(&entry.day)
        .bind(&entry.entry_time)
        .bind(&entry.exit_time)
        .execute(&self.pool)
        .await
        .map_err(AbsenError::write)?;
        Ok(())
    }

    async fn geofence(&self) -> Result<Option<GeofenceSettings>, AbsenError> {
        let row: Option<(f64, f64, f64)> =
            sqlx::query_as("SELECT ref_lat, ref_lng, limit_m FROM geofence WHERE id = 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(AbsenError::read)?;

        Ok(row.map(|(lat, lng, limit_m)| GeofenceSettings {
            reference: Coordinate::new(lat, lng),
            limit_m,
        }))
    }

    async fn set_geofence(&self, settings: &GeofenceSettings) -> Result<(), AbsenError> {
        sqlx::query(
            r#"
            INSERT INTO geofence (id, ref_lat, ref_lng, limit_m)
            VALUES (1, ?, ?, ?)
            ON DUPLICATE KEY UPDATE ref_lat = VALUES(ref_lat), ref_lng = VALUES(ref_lng), limit_m = VALUES(limit_m)
            "#,
        )
        .bind(settings.reference.latitude)
        .bind(settings.reference.longitude)
        .bind(settings.limit_m)
        .execute(&self.pool)
        .await
        .map_err(AbsenError::write)?;
        Ok(())
    }
}
