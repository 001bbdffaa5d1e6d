use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    cache::ScheduleCache,
    clock::Clock,
    engine::{
        Decision, checkout_note, classify, distance::distance_between, format_note, minutes_of_day,
        within_limit,
    },
    error::AbsenError,
    model::{
        attendance::{AttendanceRecord, AttendanceType, NewAttendance, RecordId},
        geo::{Coordinate, GeofenceSettings},
        schedule::{Hari, ScheduleEntry},
    },
    store::AttendanceStore,
};

/// Knobs the service takes from [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct AttendanceSettings {
    pub offset: FixedOffset,
    pub fetch_timeout: Duration,
    pub geofence_defaults: GeofenceSettings,
}

/// Who is submitting.
#[derive(Debug, Clone)]
pub struct Submitter {
    pub user_id: u64,
    pub display_name: String,
}

pub struct Submission {
    pub position: Coordinate,
    pub photo: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceOutcome {
    #[schema(example = 42)]
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    #[schema(example = "-15")]
    pub time_note: String,
    #[schema(example = "Telat 15 menit")]
    pub time_note_text: String,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct GeofenceCheck {
    pub distance_m: f64,
    pub limit_m: f64,
    pub within: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResolvedSchedule {
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    pub from_cache: bool,
}

/// Attendance submission flow.
///
/// Each remote call is its own await point; there is no transaction and no
/// lock around the checkout cleanup and insert.
#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    cache: ScheduleCache,
    clock: Arc<dyn Clock>,
    settings: AttendanceSettings,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        cache: ScheduleCache,
        clock: Arc<dyn Clock>,
        settings: AttendanceSettings,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn AttendanceStore> {
        &self.store
    }

    pub fn cache(&self) -> &ScheduleCache {
        &self.cache
    }

    pub fn offset(&self) -> FixedOffset {
        self.settings.offset
    }

    pub fn local_now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.settings.offset)
    }

    pub fn today(&self) -> (NaiveDate, String) {
        let now = self.local_now();
        (now.date_naive(), Hari::from(now.weekday()).to_string())
    }

    pub async fn geofence(&self) -> Result<GeofenceSettings, AbsenError> {
        Ok(self
            .store
            .geofence()
            .await?
            .unwrap_or(self.settings.geofence_defaults))
    }

    pub async fn check_position(&self, position: Coordinate) -> Result<GeofenceCheck, AbsenError> {
        position.validate()?;
        let fence = self.geofence().await?;
        let distance_m = distance_between(position, fence.reference);

        Ok(GeofenceCheck {
            distance_m,
            limit_m: fence.limit_m,
            within: within_limit(distance_m, fence.limit_m),
        })
    }

    /// Today's schedule from the remote store, or the cached one while the
    /// fetch is still pending.
    ///
    /// A pending fetch keeps running after the timeout and refreshes the
    /// cache when it lands.
    pub async fn resolve_schedule(&self, day: &str) -> Result<Option<ResolvedSchedule>, AbsenError> {
        let store = self.store.clone();
        let cache = self.cache.clone();
        let wanted = day.to_string();

        let fetch = tokio::spawn(async move {
            let fetched = store.query_schedule_by_weekday(&wanted).await;
            if let Ok(Some(entry)) = &fetched {
                let entry = entry.clone();
                // preferences may write to disk
                match tokio::task::spawn_blocking(move || cache.save(&entry)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, day = %wanted, "Failed to cache schedule"),
                    Err(e) => warn!(error = %e, day = %wanted, "Schedule cache task failed"),
                }
            }
            fetched
        });

        match tokio::time::timeout(self.settings.fetch_timeout, fetch).await {
            Ok(Ok(Ok(entry))) => Ok(entry.map(|entry| ResolvedSchedule {
                entry,
                from_cache: false,
            })),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(join_err)) => Err(AbsenError::read(join_err)),
            Err(_) => {
                info!(day, "Schedule fetch still pending, using cache");
                Ok(self.cached_schedule(day))
            }
        }
    }

    fn cached_schedule(&self, day: &str) -> Option<ResolvedSchedule> {
        let entry = self.cache.load()?;
        if entry.day != day {
            // no expiry: yesterday's entry is still served
            warn!(cached_day = %entry.day, day, "Serving cached schedule of another day");
        }
        Some(ResolvedSchedule {
            entry,
            from_cache: true,
        })
    }

    /// Geofence gate, then classify against today's schedule and write.
    #[instrument(name = "attendance_submit", skip(self, who, submission), fields(user_id = who.user_id))]
    pub async fn submit(&self, who: &Submitter, submission: Submission) -> Result<AttendanceOutcome, AbsenError> {
        if submission.photo.is_empty() {
            return Err(AbsenError::InvalidInput("photo is required".into()));
        }

        let check = self.check_position(submission.position).await?;
        if !check.within {
            warn!(distance_m = check.distance_m, limit_m = check.limit_m, "Submission outside geofence");
            return Err(AbsenError::OutsideGeofence {
                distance_m: check.distance_m,
                limit_m: check.limit_m,
            });
        }

        let now = self.local_now();
        let day = Hari::from(now.weekday()).to_string();
        let schedule = self.resolve_schedule(&day).await?;

        let decision = classify(minutes_of_day(now), schedule.as_ref().map(|s| &s.entry), &day)?;
        debug!(?decision, "Classified submission");

        match decision {
            Decision::CheckIn { time_note } => self.check_in(who, submission.photo, time_note, now).await,
            Decision::CheckOut => self.handle_checkout(who, submission.photo, now).await,
        }
    }

    async fn check_in(
        &self,
        who: &Submitter,
        photo: Vec<u8>,
        time_note: String,
        now: DateTime<FixedOffset>,
    ) -> Result<AttendanceOutcome, AbsenError> {
        let today = now.date_naive();
        let existing = self
            .store
            .query_by_user_and_type(who.user_id, AttendanceType::Masuk)
            .await?;
        if existing.iter().any(|r| r.is_on(today, self.settings.offset)) {
            return Err(AbsenError::AlreadyCheckedIn);
        }

        let id = self
            .store
            .insert(NewAttendance {
                user_id: who.user_id,
                display_name: who.display_name.clone(),
                kind: AttendanceType::Masuk,
                photo,
                time_note: time_note.clone(),
            })
            .await?;

        info!(user_id = who.user_id, record_id = id, %time_note, "Checked in");
        Ok(outcome(id, AttendanceType::Masuk, time_note))
    }

    /// Checkout procedure: duration since today's check-in, drop any
    /// checkout already written today, then insert the new one.
    ///
    /// `now` is the instant the submission was classified at. Steps already
    /// done are not rolled back when a later one fails.
    #[instrument(name = "attendance_checkout", skip(self, who, photo), fields(user_id = who.user_id))]
    pub async fn handle_checkout(
        &self,
        who: &Submitter,
        photo: Vec<u8>,
        now: DateTime<FixedOffset>,
    ) -> Result<AttendanceOutcome, AbsenError> {
        let offset = self.settings.offset;
        let today = now.date_naive();

        let masuk_hari_ini = self
            .store
            .query_by_user_and_type(who.user_id, AttendanceType::Masuk)
            .await?
            .into_iter()
            .find(|r| r.is_on(today, offset));

        let time_note = checkout_note(masuk_hari_ini.map(|m| now.signed_duration_since(m.timestamp)));

        let stale: Vec<AttendanceRecord> = self
            .store
            .query_by_user_and_type(who.user_id, AttendanceType::Keluar)
            .await?
            .into_iter()
            .filter(|r| r.is_on(today, offset))
            .collect();

        for record in &stale {
            debug!(record_id = record.id, "Removing earlier checkout of today");
            self.store.delete(record.id).await?;
        }

        let id = self
            .store
            .insert(NewAttendance {
                user_id: who.user_id,
                display_name: who.display_name.clone(),
                kind: AttendanceType::Keluar,
                photo,
                time_note: time_note.clone(),
            })
            .await?;

        info!(record_id = id, replaced = stale.len(), %time_note, "Checked out");
        Ok(outcome(id, AttendanceType::Keluar, time_note))
    }

    /// Newest first, optionally one type only.
    pub async fn history(
        &self,
        user_id: u64,
        kind: Option<AttendanceType>,
    ) -> Result<Vec<AttendanceRecord>, AbsenError> {
        match kind {
            Some(kind) => self.store.query_by_user_and_type(user_id, kind).await,
            None => self.store.list_by_user(user_id).await,
        }
    }

    pub async fn delete_own(&self, user_id: u64, id: RecordId) -> Result<(), AbsenError> {
        match self.store.get(id).await? {
            Some(record) if record.user_id == user_id => self.store.delete(id).await,
            _ => Err(AbsenError::NotFound),
        }
    }

    /// Delete every record of the user; returns how many went.
    pub async fn wipe_history(&self, user_id: u64) -> Result<usize, AbsenError> {
        let records = self.store.list_by_user(user_id).await?;
        for record in &records {
            self.store.delete(record.id).await?;
        }
        info!(user_id, deleted = records.len(), "History wiped");
        Ok(records.len())
    }
}

fn outcome(id: RecordId, kind: AttendanceType, time_note: String) -> AttendanceOutcome {
    AttendanceOutcome {
        id,
        kind,
        time_note_text: format_note(&time_note, kind),
        time_note,
    }
}

