use std::path::PathBuf;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};

mod config;
mod db;
mod handlers;
mod models;
mod services;

use config::Config;
use services::backup::BackupJobConfig;

async fn index(state: web::Data<models::AppState>) -> actix_web::Result<NamedFile> {
    let static_path = state.config.static_files_path.as_deref().unwrap_or("./static");
    Ok(NamedFile::open(format!("{}/index.html", static_path))?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    log::info!("Starting server at {}:{}", config.host, config.port);

    if let Some(ref path) = config.static_files_path {
        log::info!("Serving static files from: {}", path);
    }

    // Create database pool
    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to create database pool");

    // Run migrations
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    log::info!("Database migrations completed");

    if config.seed_sample_data {
        if let Err(e) = services::seed::seed_sample_data(&pool).await {
            log::error!("Failed to populate sample data: {}", e);
        }
    }

    // Start daily backup scheduler
    match (&config.backup_dir, config.backup_time) {
        (Some(dir), Some(time)) => {
            let job_config = BackupJobConfig {
                database_url: config.database_url.clone(),
                backup_dir: PathBuf::from(dir),
                time,
            };
            let pool_for_scheduler = pool.clone();
            tokio::spawn(async move {
                services::backup::start_scheduler(pool_for_scheduler, job_config).await;
            });
        }
        (Some(_), None) => {
            log::info!("BACKUP_TIME not set, only manual backups are available")
        }
        _ => log::info!("BACKUP_DIR not set, backups are disabled"),
    }

    // Create app state
    let app_state = web::Data::new(models::AppState {
        db: pool.clone(),
        config: config.clone(),
    });

    let static_files_path = config.static_files_path.clone();
    let allowed_origins = config.cors_origins.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let allowed_origins = allowed_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins
                    .iter()
                    .any(|allowed| origin_str.starts_with(allowed))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Content-Type"])
            .max_age(3600);

        let mut app = App::new()
            .app_data(app_state.clone())
            .app_data(handlers::json_config())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(handlers::configure_routes);

        // Serve the single-page frontend if a path is configured
        if let Some(ref path) = static_files_path {
            app = app
                .service(Files::new("/assets", format!("{}/assets", path)))
                .default_service(web::route().to(index));
        }

        app
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    // Leave a self-contained database file behind on shutdown
    if let Err(e) = db::checkpoint(&pool).await {
        log::error!("Final checkpoint on shutdown failed: {}", e);
    }
    pool.close().await;

    Ok(())
}
