use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failure taxonomy for the attendance flow.
///
/// Every remote failure ends up here and is rendered as a terminal,
/// user-visible `{"message": ...}` body. Nothing is retried automatically.
#[derive(Debug, Display)]
pub enum AbsenError {
    #[display(fmt = "No schedule found for {}", _0)]
    ScheduleNotFound(String),

    #[display(fmt = "Read failed: {}", _0)]
    Read(String),

    #[display(fmt = "Write failed: {}", _0)]
    Write(String),

    #[display(
        fmt = "Outside the allowed area: {:.0} m from the office (limit {:.0} m)",
        distance_m,
        limit_m
    )]
    OutsideGeofence { distance_m: f64, limit_m: f64 },

    #[display(fmt = "Already checked in today")]
    AlreadyCheckedIn,

    #[display(fmt = "Not found")]
    NotFound,

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    InvalidInput(String),

    #[display(fmt = "Storage error: {}", _0)]
    Storage(String),
}

impl std::error::Error for AbsenError {}

impl AbsenError {
    pub fn read(e: impl std::fmt::Display) -> Self {
        AbsenError::Read(e.to_string())
    }

    pub fn write(e: impl std::fmt::Display) -> Self {
        AbsenError::Write(e.to_string())
    }
}

impl ResponseError for AbsenError {
    fn status_code(&self) -> StatusCode {
        match self {
            AbsenError::ScheduleNotFound(_) | AbsenError::NotFound => StatusCode::NOT_FOUND,
            AbsenError::OutsideGeofence { .. } | AbsenError::Forbidden(_) => StatusCode::FORBIDDEN,
            AbsenError::AlreadyCheckedIn => StatusCode::CONFLICT,
            AbsenError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AbsenError::Read(_) | AbsenError::Write(_) => StatusCode::BAD_GATEWAY,
            AbsenError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geofence_message_rounds_to_meters() {
        let e = AbsenError::OutsideGeofence {
            distance_m: 152.6,
            limit_m: 100.0,
        };
        assert_eq!(
            e.to_string(),
            "Outside the allowed area: 153 m from the office (limit 100 m)"
        );
        assert_eq!(e.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn remote_failures_are_bad_gateway() {
        assert_eq!(AbsenError::read("timeout").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AbsenError::write("denied").to_string(), "Write failed: denied");
    }
}
