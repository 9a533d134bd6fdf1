use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

use attendance::config::Config;
use attendance::db::init_db;
use attendance::directory::{MySqlPersonDirectory, PersonDirectory};
use attendance::docs::ApiDoc;
use attendance::notify::{MySqlNotificationSink, NotificationSink};
use attendance::routes;
use attendance::service::{
    AbsenteeSweeper, JustificationWorkflow, ScanProcessor, StatsAggregator, SweepScheduler,
};
use attendance::store::{AttendanceStore, MySqlAttendanceStore};

use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let clock = config.clock()?;

    let store: Arc<dyn AttendanceStore> = Arc::new(MySqlAttendanceStore::new(pool.clone()));
    let directory: Arc<dyn PersonDirectory> = Arc::new(MySqlPersonDirectory::new(
        pool.clone(),
        config.person_cache_ttl,
    ));
    let notifier: Arc<dyn NotificationSink> = Arc::new(MySqlNotificationSink::new(pool.clone()));

    let scanner = Data::new(ScanProcessor::new(store.clone(), directory.clone(), clock));
    let workflow = Data::new(JustificationWorkflow::new(
        store.clone(),
        directory.clone(),
        notifier,
    ));
    let stats = Data::new(StatsAggregator::new(store.clone(), directory.clone()));

    let sweeper = Arc::new(AbsenteeSweeper::new(store, directory));
    SweepScheduler::new(sweeper, clock, config.sweep_at).spawn();
    info!(sweep_at = %config.sweep_at, "Absentee sweep scheduler started");

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(scanner.clone())
            .app_data(workflow.clone())
            .app_data(stats.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
