use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::{env, str::FromStr, time::Duration};

use crate::{
    model::geo::{Coordinate, GeofenceSettings},
    service::AttendanceSettings,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    // Attendance
    pub utc_offset_minutes: i32,
    pub prefs_path: String,
    pub schedule_fetch_timeout_ms: u64,
    pub geofence_ref_lat: f64,
    pub geofence_ref_lng: f64,
    pub geofence_limit_m: f64,
    pub reminder_lead_minutes: u32,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: or_default("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: or_default("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: or_default("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: or_default("API_PREFIX", "/api".to_string())?,
            log_dir: or_default("LOG_DIR", "logs".to_string())?,

            utc_offset_minutes: or_default("UTC_OFFSET_MINUTES", 7 * 60)?, // WIB
            prefs_path: or_default("PREFS_PATH", "data/preferences.json".to_string())?,
            schedule_fetch_timeout_ms: or_default("SCHEDULE_FETCH_TIMEOUT_MS", 3000)?,
            geofence_ref_lat: or_default("GEOFENCE_REF_LAT", 0.0)?,
            geofence_ref_lng: or_default("GEOFENCE_REF_LNG", 0.0)?,
            geofence_limit_m: or_default("GEOFENCE_LIMIT_M", 100.0)?,
            reminder_lead_minutes: or_default("REMINDER_LEAD_MINUTES", 15)?,
        })
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("UTC_OFFSET_MINUTES out of range: {}", self.utc_offset_minutes))
    }

    pub fn attendance_settings(&self) -> Result<AttendanceSettings> {
        Ok(AttendanceSettings {
            offset: self.utc_offset()?,
            fetch_timeout: Duration::from_millis(self.schedule_fetch_timeout_ms),
            geofence_defaults: GeofenceSettings {
                reference: Coordinate::new(self.geofence_ref_lat, self.geofence_ref_lng),
                limit_m: self.geofence_limit_m,
            },
        })
    }
}
