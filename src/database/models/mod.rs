pub mod attendance;
pub mod payslip;
pub mod period;
pub mod user;

pub use attendance::*;
pub use payslip::*;
pub use period::*;
pub use user::*;
