//! Business logic layer

pub mod auth;
pub mod guest_not_left;
pub mod invitation;
pub mod notification;

pub use auth::{AuthService, LoginInput, LoginOutcome};
pub use guest_not_left::{GuestNotLeftService, GuestReportOutcome};
pub use invitation::{AcceptedInvitation, InvitationService, RemoveOutcome};
pub use notification::NotificationService;
