use crate::{
    auth::auth::AuthUser,
    model::geo::{Coordinate, GeofenceSettings},
    service::GeofenceCheck,
    state::AppState,
};
use actix_web::{HttpResponse, web};

/// Current reference point and allowed radius
#[utoipa::path(
    get,
    path = "/api/geofence",
    responses((status = 200, description = "Geofence", body = GeofenceSettings)),
    security(("bearer_auth" = [])),
    tag = "Geofence"
)]
pub async fn get_geofence(_auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.attendance.geofence().await?))
}

/// Move the reference point or change the radius
#[utoipa::path(
    put,
    path = "/api/geofence",
    request_body = GeofenceSettings,
    responses(
        (status = 200, description = "Stored", body = GeofenceSettings),
        (status = 400, description = "Out-of-range values"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Geofence"
)]
pub async fn put_geofence(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<GeofenceSettings>,
) -> actix_web::Result<HttpResponse> {
    auth.require_operator_or_admin()?;

    let settings = payload.into_inner();
    settings.validate()?;
    state.attendance.store().set_geofence(&settings).await?;

    tracing::info!(
        lat = settings.reference.latitude,
        lng = settings.reference.longitude,
        limit_m = settings.limit_m,
        "Geofence updated"
    );
    Ok(HttpResponse::Ok().json(settings))
}

/// Distance from the reference point and whether it is inside the limit
#[utoipa::path(
    post,
    path = "/api/geofence/check",
    request_body = Coordinate,
    responses(
        (status = 200, description = "Evaluation", body = GeofenceCheck),
        (status = 400, description = "Out-of-range coordinate")
    ),
    security(("bearer_auth" = [])),
    tag = "Geofence"
)]
pub async fn check(
    _auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<Coordinate>,
) -> actix_web::Result<HttpResponse> {
    let check = state.attendance.check_position(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(check))
}
