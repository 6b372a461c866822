use actix_web::{web, HttpResponse, Result};
use shared::{ApiError, ApiSuccess, HistoryType, UpdateHistoryEntryRequest, UpsertMemberRequest};

use crate::models::AppState;
use crate::services::members::{self as member_service, MemberError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/members")
            .route("", web::post().to(create_member))
            .route("/{member_id}", web::get().to(get_member))
            .route("/{member_id}", web::put().to(update_member))
            .route("/{member_id}", web::delete().to(delete_member))
            .route(
                "/{member_id}/history/{history_type}/{entry_id}",
                web::put().to(update_history_entry),
            )
            .route(
                "/{member_id}/history/{history_type}/{entry_id}",
                web::delete().to(delete_history_entry),
            ),
    );
}

fn member_error_response(e: MemberError, action: &str) -> HttpResponse {
    match e {
        MemberError::Validation(message) => HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message,
        }),
        MemberError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Member not found".to_string(),
        }),
        MemberError::HistoryEntryNotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "History entry not found for this member".to_string(),
        }),
        MemberError::OnlyEntry(history_type) => HttpResponse::BadRequest().json(ApiError {
            error: "only_entry".to_string(),
            message: MemberError::OnlyEntry(history_type).to_string(),
        }),
        MemberError::DatabaseError(e) => {
            log::error!("Error trying to {}: {:?}", action, e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {}", action),
            })
        }
    }
}

fn parse_history_type(raw: &str) -> Result<HistoryType, HttpResponse> {
    raw.parse().map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_history_type".to_string(),
            message: format!(
                "Unknown history type '{}', expected statusHistory, monthlyFeeHistory or paymentCycleDayHistory",
                raw
            ),
        })
    })
}

async fn create_member(
    state: web::Data<AppState>,
    body: web::Json<UpsertMemberRequest>,
) -> Result<HttpResponse> {
    match member_service::upsert_member(&state.db, &body.into_inner()).await {
        Ok(member) => Ok(HttpResponse::Created().json(ApiSuccess::new(member))),
        Err(e) => Ok(member_error_response(e, "add member")),
    }
}

async fn get_member(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    match member_service::get_member(&state.db, &path.into_inner()).await {
        Ok(Some(member)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(member))),
        Ok(None) => Ok(member_error_response(MemberError::NotFound, "get member")),
        Err(e) => Ok(member_error_response(e, "get member")),
    }
}

async fn update_member(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpsertMemberRequest>,
) -> Result<HttpResponse> {
    // The id in the URL wins over any id in the body
    let mut request = body.into_inner();
    request.id = Some(path.into_inner());

    match member_service::upsert_member(&state.db, &request).await {
        Ok(member) => Ok(HttpResponse::Ok().json(ApiSuccess::new(member))),
        Err(e) => Ok(member_error_response(e, "update member")),
    }
}

async fn delete_member(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match member_service::delete_member(&state.db, &path.into_inner()).await {
        Ok(true) => Ok(HttpResponse::NoContent().finish()),
        Ok(false) => Ok(member_error_response(MemberError::NotFound, "delete member")),
        Err(e) => Ok(member_error_response(e, "delete member")),
    }
}

async fn update_history_entry(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    body: web::Json<UpdateHistoryEntryRequest>,
) -> Result<HttpResponse> {
    let (member_id, history_type, entry_id) = path.into_inner();
    let history_type = match parse_history_type(&history_type) {
        Ok(history_type) => history_type,
        Err(response) => return Ok(response),
    };

    match member_service::update_history_entry(
        &state.db,
        &member_id,
        &entry_id,
        history_type,
        body.new_effective_date,
    )
    .await
    {
        Ok(member) => Ok(HttpResponse::Ok().json(ApiSuccess::new(member))),
        Err(e) => Ok(member_error_response(e, "update history entry")),
    }
}

async fn delete_history_entry(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse> {
    let (member_id, history_type, entry_id) = path.into_inner();
    let history_type = match parse_history_type(&history_type) {
        Ok(history_type) => history_type,
        Err(response) => return Ok(response),
    };

    match member_service::delete_history_entry(&state.db, &member_id, &entry_id, history_type).await {
        Ok(member) => Ok(HttpResponse::Ok().json(ApiSuccess::new(member))),
        Err(e) => Ok(member_error_response(e, "delete history entry")),
    }
}
