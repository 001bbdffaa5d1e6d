use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;

use absen::{
    cache::LocalPreferences,
    clock::SystemClock,
    config::Config,
    db::{ensure_schema, init_db},
    docs::ApiDoc,
    location,
    notify::LogNotifier,
    routes,
    state::AppState,
    store::MySqlStore,
    utils::{email_cache, email_filter},
};
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "absen"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "absen.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    ensure_schema(&pool).await.context("Failed to create schema")?;

    let prefs = Arc::new(LocalPreferences::open(&config.prefs_path)?);
    let state = AppState::new(
        Arc::new(MySqlStore::new(pool.clone())),
        prefs,
        Arc::new(SystemClock),
        config.attendance_settings()?,
        Arc::new(LogNotifier),
        config.reminder_lead_minutes,
    );

    let pool_for_filter_warmup = pool.clone();
    let pool_for_cache_warmup = pool.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = email_filter::warmup_email_filter(&pool_for_filter_warmup, 100).await {
            error!(error = %e, "Failed to warm up email filter");
        }
    });

    actix_web::rt::spawn(async move {
        // recent users only, in batches of 250
        if let Err(e) = email_cache::warmup_email_cache(&pool_for_cache_warmup, 30, 250).await {
            error!(error = %e, "Failed to warm up email cache");
        }
    });

    actix_web::rt::spawn(location::run_monitor(
        state.location.subscribe(),
        state.attendance.clone(),
        state.board.clone(),
    ));
    actix_web::rt::spawn(state.reminders.clone().run_daily(state.attendance.clone()));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();
    let state = Data::new(state);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()))
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .app_data(state.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
