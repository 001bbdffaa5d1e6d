use crate::{
    auth::auth::AuthUser,
    error::AbsenError,
    location::{GeofenceStatus, LocationEvent},
    model::geo::Coordinate,
    state::AppState,
};
use actix_web::{HttpResponse, web};

/// Report the device position; evaluated in the background
#[utoipa::path(
    post,
    path = "/api/location",
    request_body = Coordinate,
    responses(
        (status = 202, description = "Queued"),
        (status = 400, description = "Out-of-range coordinate")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn report(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<Coordinate>,
) -> actix_web::Result<HttpResponse> {
    let position = payload.into_inner();
    position.validate()?;

    let receivers = state.location.publish(LocationEvent {
        user_id: auth.user_id,
        position,
        recorded_at: state.clock.now(),
    });
    tracing::debug!(user_id = auth.user_id, receivers, "Location published");

    Ok(HttpResponse::Accepted().finish())
}

/// Latest evaluated position of the caller
#[utoipa::path(
    get,
    path = "/api/location/status",
    responses(
        (status = 200, description = "Latest status", body = GeofenceStatus),
        (status = 404, description = "No recent position")
    ),
    security(("bearer_auth" = [])),
    tag = "Location"
)]
pub async fn status(auth: AuthUser, state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    let status = state.board.get(auth.user_id).await.ok_or(AbsenError::NotFound)?;
    Ok(HttpResponse::Ok().json(status))
}
