use chrono::{NaiveTime, Timelike, Weekday};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumString};
use utoipa::ToSchema;

/// Expected attendance window for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ScheduleEntry {
    #[schema(example = "senin")]
    pub day: String,
    #[schema(example = "08:00")]
    pub entry_time: String,
    #[schema(example = "17:00")]
    pub exit_time: String,
}

impl ScheduleEntry {
    pub fn new(day: impl Into<String>, entry_time: impl Into<String>, exit_time: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            entry_time: entry_time.into(),
            exit_time: exit_time.into(),
        }
    }

    pub fn entry_minutes(&self) -> u32 {
        minutes_or_midnight(&self.entry_time)
    }

    pub fn exit_minutes(&self) -> u32 {
        minutes_or_midnight(&self.exit_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "malformed time {:?}", _0)]
pub struct MalformedTimeError(pub String);

impl std::error::Error for MalformedTimeError {}

/// Strip stray quote characters left over from loosely typed documents.
pub fn sanitize_time(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '"' | '\''))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse a 24-hour `HH:MM` into minutes since midnight.
pub fn parse_minutes(raw: &str) -> Result<u32, MalformedTimeError> {
    let cleaned = sanitize_time(raw);
    NaiveTime::parse_from_str(&cleaned, "%H:%M")
        .map(|t| t.hour() * 60 + t.minute())
        .map_err(|_| MalformedTimeError(raw.to_string()))
}

/// Malformed times count as `00:00`.
pub fn minutes_or_midnight(raw: &str) -> u32 {
    parse_minutes(raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Falling back to 00:00");
        0
    })
}

/// Weekday names as stored in the `schedule` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Hari {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
    Minggu,
}

impl From<Weekday> for Hari {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Hari::Senin,
            Weekday::Tue => Hari::Selasa,
            Weekday::Wed => Hari::Rabu,
            Weekday::Thu => Hari::Kamis,
            Weekday::Fri => Hari::Jumat,
            Weekday::Sat => Hari::Sabtu,
            Weekday::Sun => Hari::Minggu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_plain_and_quoted_times() {
        assert_eq!(parse_minutes("08:00"), Ok(480));
        assert_eq!(parse_minutes("\"17:30\""), Ok(1050));
        assert_eq!(parse_minutes(" '23:59' "), Ok(1439));
    }

    #[test]
    fn malformed_times_fall_back_to_midnight() {
        assert!(parse_minutes("25:00").is_err());
        assert!(parse_minutes("noon").is_err());
        let entry = ScheduleEntry::new("senin", "8.00", "");
        assert_eq!(entry.entry_minutes(), 0);
        assert_eq!(entry.exit_minutes(), 0);
    }

    #[test]
    fn weekday_names_are_lowercase_indonesian() {
        assert_eq!(Hari::from(Weekday::Mon).to_string(), "senin");
        assert_eq!(Hari::from(Weekday::Sun).as_ref(), "minggu");
        assert_eq!(Hari::from_str("jumat").unwrap(), Hari::Jumat);
    }
}
