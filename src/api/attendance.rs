use crate::{
    auth::auth::AuthUser,
    engine::format_note,
    error::AbsenError,
    model::{
        attendance::{AttendanceRecord, AttendanceType, RecordId},
        geo::Coordinate,
    },
    service::{AttendanceOutcome, Submission},
    state::AppState,
};
use actix_web::{
    HttpResponse,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    web,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::FixedOffset;
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SubmitAttendance {
    #[schema(example = -6.200000)]
    pub latitude: f64,
    #[schema(example = 106.816666)]
    pub longitude: f64,
    /// selfie, base64
    #[schema(example = "/9j/4AAQSkZJRg==")]
    pub photo: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Only `masuk` or only `keluar`
    #[serde(rename = "type")]
    pub kind: Option<AttendanceType>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceView {
    pub id: RecordId,
    #[schema(example = "budi@kantor.id")]
    pub name: String,
    #[schema(example = "2026-03-02T08:15:00+07:00", format = "date-time", value_type = String)]
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    #[schema(example = "-15")]
    pub time_note: String,
    #[schema(example = "Telat 15 menit")]
    pub time_note_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl AttendanceView {
    fn from_record(record: &AttendanceRecord, offset: FixedOffset, with_photo: bool) -> Self {
        Self {
            id: record.id,
            name: record.display_name.clone(),
            timestamp: record.timestamp.with_timezone(&offset).to_rfc3339(),
            kind: record.kind,
            time_note: record.time_note.clone(),
            time_note_text: format_note(&record.time_note, record.kind),
            photo: with_photo.then(|| STANDARD.encode(&record.photo)),
        }
    }
}

/// Check in or out, decided by the clock and today's schedule
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = SubmitAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = AttendanceOutcome),
        (status = 400, description = "Bad photo or coordinate"),
        (status = 403, description = "Outside the geofence"),
        (status = 404, description = "No schedule for today"),
        (status = 409, description = "Already checked in today"),
        (status = 502, description = "Remote store failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn submit(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<SubmitAttendance>,
) -> actix_web::Result<HttpResponse> {
    let payload = payload.into_inner();
    let photo = STANDARD
        .decode(payload.photo.trim())
        .map_err(|_| AbsenError::InvalidInput("photo must be base64".into()))?;

    let outcome = state
        .attendance
        .submit(
            &auth.submitter(),
            Submission {
                position: Coordinate::new(payload.latitude, payload.longitude),
                photo,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(outcome))
}

/// Own attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(HistoryQuery),
    responses((status = 200, description = "History", body = [AttendanceView])),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<HttpResponse> {
    let offset = state.attendance.offset();
    let records = state.attendance.history(auth.user_id, query.kind).await?;

    let views: Vec<AttendanceView> = records
        .iter()
        .map(|r| AttendanceView::from_record(r, offset, true))
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// Delete one of the caller's own records
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Record id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such record for this user")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_record(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<RecordId>,
) -> actix_web::Result<HttpResponse> {
    state.attendance.delete_own(auth.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Wipe the caller's history
#[utoipa::path(
    delete,
    path = "/api/attendance",
    responses((status = 200, description = "Wiped", body = Object, example = json!({"deleted": 4}))),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn wipe_history(auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    let deleted = state.attendance.wipe_history(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": deleted })))
}

fn sse_frame(records: &[AttendanceRecord], offset: FixedOffset) -> Result<web::Bytes, serde_json::Error> {
    let views: Vec<AttendanceView> = records
        .iter()
        .map(|r| AttendanceView::from_record(r, offset, false))
        .collect();
    let json = serde_json::to_string(&views)?;
    Ok(web::Bytes::from(format!("data: {json}\n\n")))
}

/// Live history as server-sent events: the current list, then one frame per change
#[utoipa::path(
    get,
    path = "/api/attendance/stream",
    responses((status = 200, description = "text/event-stream of history snapshots")),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn stream_history(auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    // subscribe before reading so no write slips between the two
    let subscription = state.attendance.store().subscribe(auth.user_id);
    let initial = Arc::new(state.attendance.history(auth.user_id, None).await?);
    let offset = state.attendance.offset();

    let frames = stream::once(async move { initial })
        .chain(subscription.into_stream())
        .map(move |records| sse_frame(&records, offset));

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(frames))
}
