use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::scheduler::{JobHandle, JobScheduler};
use crate::{
    cache::{Preferences, ScheduleCache},
    clock::Clock,
    model::schedule::{Hari, ScheduleEntry},
    service::AttendanceService,
};

#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub day: String,
    pub entry_time: String,
    pub fire_at: DateTime<FixedOffset>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, reminder: Reminder);
}

/// Writes reminders to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, reminder: Reminder) {
        info!(day = %reminder.day, entry_time = %reminder.entry_time, "Check-in reminder");
    }
}

/// `lead_minutes` before the entry time on `day`, clamped to midnight.
pub fn reminder_time(
    schedule: &ScheduleEntry,
    day: NaiveDate,
    offset: FixedOffset,
    lead_minutes: u32,
) -> Option<DateTime<FixedOffset>> {
    let minutes = schedule.entry_minutes().saturating_sub(lead_minutes);
    let local = day.and_hms_opt(0, 0, 0)? + Duration::minutes(i64::from(minutes));
    offset.from_local_datetime(&local).single()
}

struct PlannerInner {
    scheduler: Arc<dyn JobScheduler>,
    notifier: Arc<dyn Notifier>,
    cache: ScheduleCache,
    prefs: Arc<dyn Preferences>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    lead_minutes: u32,
    pending: Mutex<Option<JobHandle>>,
}

/// Keeps at most one pending check-in reminder for today.
#[derive(Clone)]
pub struct ReminderPlanner {
    inner: Arc<PlannerInner>,
}

impl ReminderPlanner {
    pub fn new(
        scheduler: Arc<dyn JobScheduler>,
        notifier: Arc<dyn Notifier>,
        cache: ScheduleCache,
        prefs: Arc<dyn Preferences>,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        lead_minutes: u32,
    ) -> Self {
        Self {
            inner: Arc::new(PlannerInner {
                scheduler,
                notifier,
                cache,
                prefs,
                clock,
                offset,
                lead_minutes,
                pending: Mutex::new(None),
            }),
        }
    }

    /// Cancel whatever is pending and schedule today's reminder from the
    /// cached schedule. Returns when it will fire, if at all.
    pub fn replan(&self) -> Option<DateTime<FixedOffset>> {
        let inner = &self.inner;
        let mut pending = match inner.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.take() {
            previous.cancel();
        }

        if !inner.prefs.notifications_enabled() {
            debug!("Notifications disabled, no reminder planned");
            return None;
        }

        let schedule = inner.cache.load()?;
        let now = inner.clock.now().with_timezone(&inner.offset);
        let today = Hari::from(now.weekday()).to_string();
        if schedule.day != today {
            debug!(cached_day = %schedule.day, %today, "Cached schedule is not today's, no reminder planned");
            return None;
        }
        let fire_at = reminder_time(&schedule, now.date_naive(), inner.offset, inner.lead_minutes)?;
        if fire_at <= now {
            debug!(%fire_at, "Reminder time already passed today");
            return None;
        }

        let reminder = Reminder {
            day: schedule.day,
            entry_time: schedule.entry_time,
            fire_at,
        };
        let notifier = inner.notifier.clone();
        let prefs = inner.prefs.clone();

        let handle = inner.scheduler.schedule_at(
            fire_at.with_timezone(&Utc),
            Box::pin(async move {
                // the user may have switched notifications off since planning
                if prefs.notifications_enabled() {
                    notifier.notify(reminder).await;
                }
            }),
        );
        *pending = Some(handle);

        info!(%fire_at, "Check-in reminder planned");
        Some(fire_at)
    }

    /// Fetch today's schedule, which also refreshes the cache, then replan.
    pub async fn refresh_and_replan(&self, service: &AttendanceService) -> Option<DateTime<FixedOffset>> {
        let (_, day) = service.today();
        if let Err(e) = service.resolve_schedule(&day).await {
            warn!(error = %e, %day, "Schedule refresh failed, planning from cache");
        }
        self.replan()
    }

    /// Refresh and replan now and after every local midnight. Never returns.
    pub async fn run_daily(self, service: AttendanceService) {
        loop {
            self.refresh_and_replan(&service).await;

            let now = self.inner.clock.now().with_timezone(&self.inner.offset);
            let wait = next_midnight(now)
                .and_then(|midnight| (midnight - now).to_std().ok())
                .unwrap_or(std::time::Duration::from_secs(3600));
            tokio::time::sleep(wait).await;
        }
    }
}

fn next_midnight(now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let tomorrow = now.date_naive().succ_opt()?.and_hms_opt(0, 0, 0)?;
    now.offset().from_local_datetime(&tomorrow).single()
}
