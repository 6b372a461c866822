use actix_web::{web, HttpResponse, Result};
use chrono::Local;
use shared::{ApiError, ApiSuccess, BackupStatus};

use crate::models::AppState;
use crate::services::backup::{self as backup_service, BackupError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/backup")
            .route("/now", web::post().to(backup_now))
            .route("/status", web::get().to(backup_status)),
    );
}

async fn backup_now(state: web::Data<AppState>) -> Result<HttpResponse> {
    match backup_service::backup_now(&state.db, &state.config).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiSuccess::new(result))),
        Err(BackupError::NotConfigured) => Ok(HttpResponse::BadRequest().json(ApiError {
            error: "backup_not_configured".to_string(),
            message: "Set BACKUP_DIR to enable backups".to_string(),
        })),
        Err(e) => {
            log::error!("Manual backup failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Backup failed: {}", e),
            }))
        }
    }
}

async fn backup_status(state: web::Data<AppState>) -> Result<HttpResponse> {
    let config = &state.config;
    let schedule = config.backup_time.filter(|_| config.backup_dir.is_some());
    let status = BackupStatus {
        is_configured: config.backup_dir.is_some(),
        backup_dir: config.backup_dir.clone(),
        is_scheduled: schedule.is_some(),
        time: config.backup_time.map(|time| time.to_string()),
        next_run: schedule
            .map(|time| backup_service::next_run_at(Local::now().naive_local(), time)),
    };

    Ok(HttpResponse::Ok().json(ApiSuccess::new(status)))
}
