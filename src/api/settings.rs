use crate::{
    auth::auth::AuthUser,
    cache::{PrefEdit, Preferences, preferences::KEY_NOTIFICATION_ENABLED},
    error::AbsenError,
    state::AppState,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct NotificationSettings {
    pub enabled: bool,
}

/// Whether check-in reminders are on
#[utoipa::path(
    get,
    path = "/api/settings/notifications",
    responses((status = 200, description = "Current setting", body = NotificationSettings)),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_notifications(_auth: AuthUser, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(NotificationSettings {
        enabled: state.prefs.notifications_enabled(),
    })
}

/// Switch check-in reminders on or off for everyone; today's reminder is replanned
#[utoipa::path(
    put,
    path = "/api/settings/notifications",
    request_body = NotificationSettings,
    responses(
        (status = 200, description = "Stored", body = NotificationSettings),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_notifications(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NotificationSettings>,
) -> actix_web::Result<HttpResponse> {
    auth.require_operator_or_admin()?;

    let prefs = state.prefs.clone();
    let enabled = payload.enabled;
    web::block(move || prefs.apply(vec![PrefEdit::flag(KEY_NOTIFICATION_ENABLED, enabled)]))
        .await
        .map_err(AbsenError::write)??;
    let next = state.reminders.replan();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "enabled": payload.enabled,
        "next_reminder": next.map(|t| t.to_rfc3339()),
    })))
}
