use actix_web::web;

use crate::handlers::{attendance, payroll};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/attendances", web::post().to(attendance::submit_attendance))
            .route("/overtimes", web::post().to(attendance::submit_overtime))
            .route(
                "/reimbursements",
                web::post().to(attendance::submit_reimbursement),
            )
            .service(
                web::scope("/payroll")
                    .route("/periods", web::post().to(payroll::create_period))
                    .route("/run", web::post().to(payroll::run_payroll))
                    .route("/summary", web::get().to(payroll::get_summary))
                    .route("/payslip", web::get().to(payroll::get_my_payslip)),
            ),
    );
}
