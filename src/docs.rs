use crate::api::{
    attendance::{AttendanceView, HistoryQuery, SubmitAttendance},
    schedule::UpsertSchedule,
    settings::NotificationSettings,
};
use crate::location::GeofenceStatus;
use crate::model::{
    attendance::AttendanceType,
    geo::{Coordinate, GeofenceSettings},
    schedule::ScheduleEntry,
};
use crate::models::{LoginReqDto, RegisterReq, TokenPair};
use crate::service::{AttendanceOutcome, GeofenceCheck, ResolvedSchedule};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absen API",
        version = "0.1.0",
        description = r#"
## Geofenced selfie attendance

- **Attendance**: one submission endpoint; the server decides check-in (`masuk`)
  or check-out (`keluar`) from the clock and today's schedule.
- **Schedule**: per-weekday entry and exit times.
- **Geofence**: reference point and allowed radius.
- **Location**: live position reports and the latest geofence status.

All `/api` routes need a bearer access token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::submit,
        crate::api::attendance::history,
        crate::api::attendance::delete_record,
        crate::api::attendance::wipe_history,
        crate::api::attendance::stream_history,

        crate::api::schedule::list_schedules,
        crate::api::schedule::today,
        crate::api::schedule::upsert_schedule,

        crate::api::geofence::get_geofence,
        crate::api::geofence::put_geofence,
        crate::api::geofence::check,

        crate::api::location::report,
        crate::api::location::status,

        crate::api::settings::get_notifications,
        crate::api::settings::put_notifications
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            TokenPair,
            SubmitAttendance,
            HistoryQuery,
            AttendanceView,
            AttendanceOutcome,
            AttendanceType,
            ScheduleEntry,
            ResolvedSchedule,
            UpsertSchedule,
            Coordinate,
            GeofenceSettings,
            GeofenceCheck,
            GeofenceStatus,
            NotificationSettings
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Accounts and tokens"),
        (name = "Attendance", description = "Check-in / check-out"),
        (name = "Schedule", description = "Weekday schedules"),
        (name = "Geofence", description = "Allowed area"),
        (name = "Location", description = "Live position"),
        (name = "Settings", description = "Local preferences"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
