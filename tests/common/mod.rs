#![allow(dead_code)]

use absen::{
    cache::{LocalPreferences, Preferences},
    clock::{Clock, FixedClock},
    config::Config,
    error::AbsenError,
    model::{
        attendance::{AttendanceRecord, AttendanceType, NewAttendance, RecordId},
        geo::{Coordinate, GeofenceSettings},
        schedule::ScheduleEntry,
    },
    notify::LogNotifier,
    service::AttendanceSettings,
    state::AppState,
    store::{AttendanceStore, MemoryStore, Subscription},
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

pub const SECRET: &str = "test-secret";

pub const OFFICE: Coordinate = Coordinate {
    latitude: -6.2,
    longitude: 106.8,
};

pub fn wib() -> FixedOffset {
    FixedOffset::east_opt(7 * 3600).unwrap()
}

/// 2026-03-02 is a Monday ("senin").
pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    wib()
        .with_ymd_and_hms(2026, 3, 2, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn settings(fetch_timeout: Duration) -> AttendanceSettings {
    AttendanceSettings {
        offset: wib(),
        fetch_timeout,
        geofence_defaults: GeofenceSettings {
            reference: OFFICE,
            limit_m: 100.0,
        },
    }
}

pub fn config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 604_800,
        rate_login_per_min: 60,
        rate_register_per_min: 30,
        rate_refresh_per_min: 30,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        utc_offset_minutes: 420,
        prefs_path: "unused.json".into(),
        schedule_fetch_timeout_ms: 1000,
        geofence_ref_lat: OFFICE.latitude,
        geofence_ref_lng: OFFICE.longitude,
        geofence_limit_m: 100.0,
        reminder_lead_minutes: 15,
    }
}

/// Memory store with knobs for slow or failing remote calls.
pub struct FlakyStore {
    pub inner: MemoryStore,
    schedule_delay_ms: AtomicU64,
    fail_schedule_reads: AtomicBool,
    fail_inserts: AtomicBool,
}

impl FlakyStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: MemoryStore::new(clock),
            schedule_delay_ms: AtomicU64::new(0),
            fail_schedule_reads: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn delay_schedule_reads(&self, by: Duration) {
        self.schedule_delay_ms.store(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_schedule_reads(&self, fail: bool) {
        self.fail_schedule_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AttendanceStore for FlakyStore {
    async fn query_by_user_and_type(
        &self,
        user_id: u64,
        kind: AttendanceType,
    ) -> Result<Vec<AttendanceRecord>, AbsenError> {
        self.inner.query_by_user_and_type(user_id, kind).await
    }

    async fn list_by_user(&self, user_id: u64) -> Result<Vec<AttendanceRecord>, AbsenError> {
        self.inner.list_by_user(user_id).await
    }

    async fn get(&self, id: RecordId) -> Result<Option<AttendanceRecord>, AbsenError> {
        self.inner.get(id).await
    }

    async fn insert(&self, record: NewAttendance) -> Result<RecordId, AbsenError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AbsenError::write("permission denied"));
        }
        self.inner.insert(record).await
    }

    async fn delete(&self, id: RecordId) -> Result<(), AbsenError> {
        self.inner.delete(id).await
    }

    fn subscribe(&self, user_id: u64) -> Subscription {
        self.inner.subscribe(user_id)
    }

    async fn query_schedule_by_weekday(&self, day: &str) -> Result<Option<ScheduleEntry>, AbsenError> {
        let delay = self.schedule_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_schedule_reads.load(Ordering::SeqCst) {
            return Err(AbsenError::read("network unreachable"));
        }
        self.inner.query_schedule_by_weekday(day).await
    }

    async fn list_schedules(&self) -> Result<Vec<ScheduleEntry>, AbsenError> {
        self.inner.list_schedules().await
    }

    async fn upsert_schedule(&self, entry: &ScheduleEntry) -> Result<(), AbsenError> {
        self.inner.upsert_schedule(entry).await
    }

    async fn geofence(&self) -> Result<Option<GeofenceSettings>, AbsenError> {
        self.inner.geofence().await
    }

    async fn set_geofence(&self, settings: &GeofenceSettings) -> Result<(), AbsenError> {
        self.inner.set_geofence(settings).await
    }
}

pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub store: Arc<FlakyStore>,
    pub prefs: Arc<LocalPreferences>,
    pub state: AppState,
}

impl Harness {
    /// Monday 08:00-17:00 stored remotely, clock at Monday 07:00.
    pub async fn new() -> Self {
        Self::with_timeout(Duration::from_secs(1)).await
    }

    pub async fn with_timeout(fetch_timeout: Duration) -> Self {
        let clock = Arc::new(FixedClock::new(monday_at(7, 0)));
        let store = Arc::new(FlakyStore::new(clock.clone()));
        let prefs = Arc::new(LocalPreferences::in_memory());

        store
            .upsert_schedule(&ScheduleEntry::new("senin", "08:00", "17:00"))
            .await
            .unwrap();

        let state = AppState::new(
            store.clone(),
            prefs.clone() as Arc<dyn Preferences>,
            clock.clone(),
            settings(fetch_timeout),
            Arc::new(LogNotifier),
            15,
        );

        Self {
            clock,
            store,
            prefs,
            state,
        }
    }

    pub fn at(&self, hour: u32, minute: u32) {
        self.clock.set(monday_at(hour, minute));
    }
}
