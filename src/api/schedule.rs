use crate::{
    auth::auth::AuthUser,
    error::AbsenError,
    model::schedule::{Hari, ScheduleEntry, parse_minutes, sanitize_time},
    service::ResolvedSchedule,
    state::AppState,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpsertSchedule {
    #[schema(example = "08:00")]
    pub entry_time: String,
    #[schema(example = "17:00")]
    pub exit_time: String,
}

/// All weekday schedules
#[utoipa::path(
    get,
    path = "/api/schedule",
    responses((status = 200, description = "Schedules", body = [ScheduleEntry])),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn list_schedules(_auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    let schedules = state.attendance.store().list_schedules().await?;
    Ok(HttpResponse::Ok().json(schedules))
}

/// Today's schedule; falls back to the cached one while the store is slow
#[utoipa::path(
    get,
    path = "/api/schedule/today",
    responses(
        (status = 200, description = "Today's schedule", body = ResolvedSchedule),
        (status = 404, description = "No schedule for today")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn today(_auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    let (_, day) = state.attendance.today();
    let resolved = state
        .attendance
        .resolve_schedule(&day)
        .await?
        .ok_or(AbsenError::ScheduleNotFound(day))?;
    Ok(HttpResponse::Ok().json(resolved))
}

/// Create or replace the schedule of one weekday
#[utoipa::path(
    put,
    path = "/api/schedule/{day}",
    params(("day" = String, Path, description = "senin, selasa, rabu, kamis, jumat, sabtu or minggu")),
    request_body = UpsertSchedule,
    responses(
        (status = 200, description = "Stored", body = ScheduleEntry),
        (status = 400, description = "Unknown day or malformed time"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn upsert_schedule(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpsertSchedule>,
) -> actix_web::Result<HttpResponse> {
    auth.require_operator_or_admin()?;

    let day = path.into_inner().trim().to_lowercase();
    Hari::from_str(&day).map_err(|_| AbsenError::InvalidInput(format!("Unknown day: {day}")))?;

    for raw in [&payload.entry_time, &payload.exit_time] {
        parse_minutes(raw).map_err(|e| AbsenError::InvalidInput(e.to_string()))?;
    }

    let entry = ScheduleEntry::new(
        day,
        sanitize_time(&payload.entry_time),
        sanitize_time(&payload.exit_time),
    );
    state.attendance.store().upsert_schedule(&entry).await?;

    tracing::info!(day = %entry.day, entry = %entry.entry_time, exit = %entry.exit_time, "Schedule updated");
    Ok(HttpResponse::Ok().json(entry))
}
