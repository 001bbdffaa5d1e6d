use std::sync::Arc;

use super::preferences::{PrefEdit, Preferences};
use crate::{error::AbsenError, model::schedule::ScheduleEntry};

pub const KEY_DAY: &str = "schedule_day";
pub const KEY_ENTRY: &str = "schedule_entry";
pub const KEY_EXIT: &str = "schedule_exit";

/// Last fetched schedule, served while the remote fetch is still pending.
///
/// Entries never expire; the next successful fetch overwrites them.
#[derive(Clone)]
pub struct ScheduleCache {
    prefs: Arc<dyn Preferences>,
}

impl ScheduleCache {
    pub fn new(prefs: Arc<dyn Preferences>) -> Self {
        Self { prefs }
    }

    pub fn save(&self, schedule: &ScheduleEntry) -> Result<(), AbsenError> {
        self.prefs.apply(vec![
            PrefEdit::text(KEY_DAY, schedule.day.clone()),
            PrefEdit::text(KEY_ENTRY, schedule.entry_time.clone()),
            PrefEdit::text(KEY_EXIT, schedule.exit_time.clone()),
        ])
    }

    /// `None` unless all three fields are present.
    pub fn load(&self) -> Option<ScheduleEntry> {
        Some(ScheduleEntry {
            day: self.prefs.get_string(KEY_DAY)?,
            entry_time: self.prefs.get_string(KEY_ENTRY)?,
            exit_time: self.prefs.get_string(KEY_EXIT)?,
        })
    }

    pub fn clear(&self) -> Result<(), AbsenError> {
        self.prefs.apply(vec![
            PrefEdit::remove(KEY_DAY),
            PrefEdit::remove(KEY_ENTRY),
            PrefEdit::remove(KEY_EXIT),
        ])
    }
}
