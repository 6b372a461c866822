use actix_web::{web, HttpResponse, Result};
use shared::{ApiError, ApiSuccess, UpsertWriteOffRequest};

use crate::models::AppState;
use crate::services::writeoffs::{self as writeoff_service, WriteOffError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/writeoffs")
            .route("", web::post().to(create_writeoff))
            .route("/{writeoff_id}", web::put().to(update_writeoff))
            .route("/{writeoff_id}", web::delete().to(delete_writeoff)),
    );
}

fn writeoff_error_response(e: WriteOffError, action: &str) -> HttpResponse {
    match e {
        WriteOffError::Validation(message) => HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message,
        }),
        WriteOffError::MemberNotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Member not found".to_string(),
        }),
        WriteOffError::DatabaseError(e) => {
            log::error!("Error trying to {}: {:?}", action, e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {}", action),
            })
        }
    }
}

async fn create_writeoff(
    state: web::Data<AppState>,
    body: web::Json<UpsertWriteOffRequest>,
) -> Result<HttpResponse> {
    match writeoff_service::upsert_writeoff(&state.db, &body.into_inner()).await {
        Ok(writeoff) => Ok(HttpResponse::Created().json(ApiSuccess::new(writeoff))),
        Err(e) => Ok(writeoff_error_response(e, "record write-off")),
    }
}

async fn update_writeoff(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpsertWriteOffRequest>,
) -> Result<HttpResponse> {
    let mut request = body.into_inner();
    request.id = Some(path.into_inner());

    match writeoff_service::upsert_writeoff(&state.db, &request).await {
        Ok(writeoff) => Ok(HttpResponse::Ok().json(ApiSuccess::new(writeoff))),
        Err(e) => Ok(writeoff_error_response(e, "update write-off")),
    }
}

async fn delete_writeoff(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match writeoff_service::delete_writeoff(&state.db, &path.into_inner()).await {
        Ok(true) => Ok(HttpResponse::NoContent().finish()),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Write-off not found".to_string(),
        })),
        Err(e) => Ok(writeoff_error_response(e, "delete write-off")),
    }
}
