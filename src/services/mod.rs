pub mod keyed_lock;
pub mod payroll;
pub mod submission;

pub use payroll::PayrollService;
pub use submission::SubmissionService;
