use actix_web::{web, HttpResponse, Result};
use shared::{ApiError, ApiSuccess, UpsertPaymentRequest};

use crate::models::AppState;
use crate::services::payments::{self as payment_service, PaymentError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("", web::post().to(create_payment))
            .route("/{payment_id}", web::put().to(update_payment))
            .route("/{payment_id}", web::delete().to(delete_payment)),
    );
}

fn payment_error_response(e: PaymentError, action: &str) -> HttpResponse {
    match e {
        PaymentError::Validation(message) => HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message,
        }),
        PaymentError::MemberNotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Member not found".to_string(),
        }),
        PaymentError::DatabaseError(e) => {
            log::error!("Error trying to {}: {:?}", action, e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {}", action),
            })
        }
    }
}

async fn create_payment(
    state: web::Data<AppState>,
    body: web::Json<UpsertPaymentRequest>,
) -> Result<HttpResponse> {
    match payment_service::upsert_payment(&state.db, &body.into_inner()).await {
        Ok(payment) => Ok(HttpResponse::Created().json(ApiSuccess::new(payment))),
        Err(e) => Ok(payment_error_response(e, "record payment")),
    }
}

async fn update_payment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpsertPaymentRequest>,
) -> Result<HttpResponse> {
    let mut request = body.into_inner();
    request.id = Some(path.into_inner());

    match payment_service::upsert_payment(&state.db, &request).await {
        Ok(payment) => Ok(HttpResponse::Ok().json(ApiSuccess::new(payment))),
        Err(e) => Ok(payment_error_response(e, "update payment")),
    }
}

async fn delete_payment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match payment_service::delete_payment(&state.db, &path.into_inner()).await {
        Ok(true) => Ok(HttpResponse::NoContent().finish()),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Payment not found".to_string(),
        })),
        Err(e) => Ok(payment_error_response(e, "delete payment")),
    }
}
