pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::AppError;
pub use services::{PayrollService, SubmissionService};

pub struct AppState {
    pub submissions: SubmissionService,
    pub payroll: PayrollService,
}
