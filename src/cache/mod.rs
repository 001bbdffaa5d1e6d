pub mod preferences;
pub mod schedule_cache;

pub use preferences::{LocalPreferences, PrefEdit, Preferences};
pub use schedule_cache::ScheduleCache;
