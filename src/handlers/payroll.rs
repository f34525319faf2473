use actix_web::{HttpResponse, Result, web};

use crate::{
    AppState, auth::Claims, database::models::CreatePeriodInput, handlers::shared::ApiResponse,
};

/// Define a new payroll period and make it the active one (admin only).
pub async fn create_period(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<CreatePeriodInput>,
) -> Result<HttpResponse> {
    let period = state
        .payroll
        .set_period(claims.user_id(), input.start_date, input.end_date)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(period)))
}

/// Run payroll for the active period (admin only).
pub async fn run_payroll(claims: Claims, state: web::Data<AppState>) -> Result<HttpResponse> {
    let result = state.payroll.run_payroll(claims.user_id()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

/// Payslip summary for the active period (admin only).
pub async fn get_summary(claims: Claims, state: web::Data<AppState>) -> Result<HttpResponse> {
    let summary = state.payroll.payslips_summary(claims.user_id()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

/// The acting employee's own payslip for the active period.
pub async fn get_my_payslip(claims: Claims, state: web::Data<AppState>) -> Result<HttpResponse> {
    let payslip = state.payroll.employee_payslip(claims.user_id()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(payslip)))
}
