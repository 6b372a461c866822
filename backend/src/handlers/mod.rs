use actix_web::{error, web, HttpResponse};
use shared::ApiError;

pub mod backup;
pub mod data;
pub mod members;
pub mod payments;
pub mod writeoffs;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(data::configure)
            .configure(members::configure)
            .configure(payments::configure)
            .configure(writeoffs::configure)
            .configure(backup::configure),
    );
}

/// Malformed or incomplete JSON bodies (bad dates included) become a 400
/// with the usual error body instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ApiError {
                error: "validation_error".to_string(),
                message,
            }),
        )
        .into()
    })
}
