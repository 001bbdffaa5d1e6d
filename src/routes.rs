use crate::{
    api::{attendance, geofence, location, schedule, settings},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Base64 selfies do not fit the default 32 KiB JSON limit.
const MAX_JSON_BYTES: usize = 8 * 1024 * 1024;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are non-zero");
    Governor::new(&cfg)
}

/// Public auth routes plus the protected API behind bearer auth and rate limits.
pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .configure(api_routes),
    );
}

/// Protected API routes, without the auth and rate-limit wrappers.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_JSON_BYTES))
        .service(
            web::scope("/attendance")
                // /attendance
                .service(
                    web::resource("")
                        .route(web::post().to(attendance::submit))
                        .route(web::get().to(attendance::history))
                        .route(web::delete().to(attendance::wipe_history)),
                )
                // /attendance/stream
                .service(web::resource("/stream").route(web::get().to(attendance::stream_history)))
                // /attendance/{id}
                .service(web::resource("/{id}").route(web::delete().to(attendance::delete_record))),
        )
        .service(
            web::scope("/schedule")
                .service(web::resource("").route(web::get().to(schedule::list_schedules)))
                .service(web::resource("/today").route(web::get().to(schedule::today)))
                .service(web::resource("/{day}").route(web::put().to(schedule::upsert_schedule))),
        )
        .service(
            web::scope("/geofence")
                .service(
                    web::resource("")
                        .route(web::get().to(geofence::get_geofence))
                        .route(web::put().to(geofence::put_geofence)),
                )
                .service(web::resource("/check").route(web::post().to(geofence::check))),
        )
        .service(
            web::scope("/location")
                .service(web::resource("").route(web::post().to(location::report)))
                .service(web::resource("/status").route(web::get().to(location::status))),
        )
        .service(
            web::scope("/settings").service(
                web::resource("/notifications")
                    .route(web::get().to(settings::get_notifications))
                    .route(web::put().to(settings::put_notifications)),
            ),
        );
}
