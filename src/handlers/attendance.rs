use actix_web::{HttpResponse, Result, web};
use chrono::Utc;

use crate::{
    AppState,
    auth::Claims,
    database::models::{SubmitAttendanceInput, SubmitOvertimeInput, SubmitReimbursementInput},
    handlers::shared::ApiResponse,
};

/// Check in for the day.
pub async fn submit_attendance(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<SubmitAttendanceInput>,
) -> Result<HttpResponse> {
    let record = state
        .submissions
        .submit_attendance(claims.user_id(), Utc::now(), input.timestamp)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}

/// Claim overtime hours finishing at the given timestamp.
pub async fn submit_overtime(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<SubmitOvertimeInput>,
) -> Result<HttpResponse> {
    let record = state
        .submissions
        .submit_overtime(claims.user_id(), input.hours, input.timestamp)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}

/// File a reimbursement claim.
pub async fn submit_reimbursement(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<SubmitReimbursementInput>,
) -> Result<HttpResponse> {
    let record = state
        .submissions
        .submit_reimbursement(claims.user_id(), input.amount, &input.description)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(record)))
}
