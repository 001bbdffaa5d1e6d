use chrono::{DateTime, FixedOffset, Timelike};

use crate::{error::AbsenError, model::schedule::ScheduleEntry};

/// Outcome of classifying a submission against today's schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Check-in with its signed minute offset, `"+10"` early or `"-15"` late.
    CheckIn { time_note: String },
    /// Past the exit time; the caller runs the checkout procedure.
    CheckOut,
}

/// Minutes since local midnight, seconds dropped.
pub fn minutes_of_day(now: DateTime<FixedOffset>) -> u32 {
    now.hour() * 60 + now.minute()
}

/// Decide check-in vs check-out.
///
/// Up to and including the entry time counts as early, up to and including
/// the exit time as late, anything after that is a checkout.
pub fn classify(now: u32, schedule: Option<&ScheduleEntry>, day: &str) -> Result<Decision, AbsenError> {
    let schedule = schedule.ok_or_else(|| AbsenError::ScheduleNotFound(day.to_string()))?;

    let entry = schedule.entry_minutes();
    let exit = schedule.exit_minutes();

    let decision = if now <= entry {
        Decision::CheckIn {
            time_note: format!("+{}", entry - now),
        }
    } else if now <= exit {
        Decision::CheckIn {
            time_note: format!("-{}", now - entry),
        }
    } else {
        Decision::CheckOut
    };

    Ok(decision)
}
