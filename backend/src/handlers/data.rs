use actix_web::{web, HttpResponse, Result};
use shared::{ApiError, ApiSuccess};

use crate::models::AppState;
use crate::services::snapshot;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/all-data", web::get().to(get_all_data));
}

/// Every member with full histories, plus all payments and write-offs
async fn get_all_data(state: web::Data<AppState>) -> Result<HttpResponse> {
    match snapshot::get_all_data(&state.db).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiSuccess::new(data))),
        Err(e) => {
            log::error!("Error loading all data: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to load data".to_string(),
            }))
        }
    }
}
