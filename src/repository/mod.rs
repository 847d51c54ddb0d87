//! Data access layer (Repository pattern)

pub mod billing;
pub mod employee;
pub mod guest_report;
pub mod home;
pub mod job;
pub mod relationship;
pub mod schedule;
pub mod user;

pub use billing::BillingRepository;
pub use employee::EmployeeRepository;
pub use guest_report::GuestReportRepository;
pub use home::HomeRepository;
pub use job::JobAssignmentRepository;
pub use relationship::ClientRelationshipRepository;
pub use schedule::ScheduleRepository;
pub use user::UserRepository;
