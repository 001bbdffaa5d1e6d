use std::sync::Arc;

use crate::{
    cache::{Preferences, ScheduleCache},
    clock::Clock,
    location::{LocationHub, StatusBoard},
    notify::{Notifier, ReminderPlanner, TokioJobScheduler},
    service::{AttendanceService, AttendanceSettings},
    store::AttendanceStore,
};

/// Everything the handlers share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub attendance: AttendanceService,
    pub prefs: Arc<dyn Preferences>,
    pub location: LocationHub,
    pub board: StatusBoard,
    pub reminders: ReminderPlanner,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        prefs: Arc<dyn Preferences>,
        clock: Arc<dyn Clock>,
        settings: AttendanceSettings,
        notifier: Arc<dyn Notifier>,
        reminder_lead_minutes: u32,
    ) -> Self {
        let cache = ScheduleCache::new(prefs.clone());
        let reminders = ReminderPlanner::new(
            Arc::new(TokioJobScheduler::new(clock.clone())),
            notifier,
            cache.clone(),
            prefs.clone(),
            clock.clone(),
            settings.offset,
            reminder_lead_minutes,
        );

        Self {
            attendance: AttendanceService::new(store, cache, clock.clone(), settings),
            prefs,
            location: LocationHub::default(),
            board: StatusBoard::default(),
            reminders,
            clock,
        }
    }
}
