use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub type RecordId = u64;

/// `masuk` is a check-in, `keluar` a check-out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceType {
    Masuk,
    Keluar,
}

/// One check-in or check-out event as stored remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub user_id: u64,
    /// the user's email
    pub display_name: String,
    /// server-assigned, monotonic per write
    pub timestamp: DateTime<Utc>,
    pub kind: AttendanceType,
    pub photo: Vec<u8>,
    /// `"+10"` / `"-15"` for check-ins, a free-text duration for check-outs
    pub time_note: String,
}

impl AttendanceRecord {
    /// Calendar day of the record in the given local timezone.
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        self.timestamp.with_timezone(&offset).date_naive()
    }

    pub fn is_on(&self, day: NaiveDate, offset: FixedOffset) -> bool {
        self.local_date(offset) == day
    }
}

/// Payload for an insert; id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: u64,
    pub display_name: String,
    pub kind: AttendanceType,
    pub photo: Vec<u8>,
    pub time_note: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn type_names_round_trip_through_strings() {
        assert_eq!(AttendanceType::Masuk.to_string(), "masuk");
        assert_eq!(AttendanceType::from_str("keluar").unwrap(), AttendanceType::Keluar);
        assert!(AttendanceType::from_str("pulang").is_err());
    }

    #[test]
    fn local_date_follows_offset() {
        // 18:30 UTC is already the next day at UTC+7
        let record = AttendanceRecord {
            id: 1,
            user_id: 7,
            display_name: "a@b.id".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 18, 30, 0).unwrap(),
            kind: AttendanceType::Masuk,
            photo: vec![],
            time_note: "+0".into(),
        };
        let wib = FixedOffset::east_opt(7 * 3600).unwrap();
        assert_eq!(record.local_date(wib), NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert!(!record.is_on(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), wib));
    }
}
