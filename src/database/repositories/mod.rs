pub mod attendance;
pub mod payslip;
pub mod period;
pub mod user;
