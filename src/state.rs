//! Application state traits for dependency injection
//!
//! This module defines traits that abstract the application state,
//! enabling the same handler code to work with both production
//! and test implementations.

use crate::jwt::JwtManager;
use crate::repository::{
    BillingRepository, ClientRelationshipRepository, EmployeeRepository, GuestReportRepository,
    HomeRepository, JobAssignmentRepository, ScheduleRepository, UserRepository,
};
use crate::service::{AuthService, GuestNotLeftService, InvitationService, NotificationService};

/// Trait for states that provide authentication
pub trait HasAuth: Clone + Send + Sync + 'static {
    /// The user repository type
    type AuthUserRepo: UserRepository;

    /// Get the auth service
    fn auth_service(&self) -> &AuthService<Self::AuthUserRepo>;

    /// Get the JWT manager for token verification
    fn jwt_manager(&self) -> &JwtManager;
}

/// Trait for states that provide the invitation lifecycle
pub trait HasInvitations: HasAuth {
    /// The relationship repository type
    type RelationshipRepo: ClientRelationshipRepository;
    /// The user repository type
    type UserRepo: UserRepository;
    /// The home repository type
    type HomeRepo: HomeRepository;
    /// The billing repository type
    type BillingRepo: BillingRepository;
    /// The schedule repository type (deactivation cascade)
    type ScheduleRepo: ScheduleRepository;

    /// Get the invitation service
    fn invitation_service(
        &self,
    ) -> &InvitationService<
        Self::RelationshipRepo,
        Self::UserRepo,
        Self::HomeRepo,
        Self::BillingRepo,
        Self::ScheduleRepo,
    >;

    /// Get the notification dispatcher (invitation emails are sent by the
    /// router, best-effort, after the mutation succeeds)
    fn notification_service(&self) -> &NotificationService;

    /// Direct user lookups (inviter display names)
    fn user_repo(&self) -> &Self::UserRepo;
}

/// Trait for states that provide the guest-not-left workflow
/// (routes are bearer-authenticated, hence the HasAuth bound)
pub trait HasGuestNotLeft: HasAuth {
    /// The job assignment repository type
    type AssignmentRepo: JobAssignmentRepository;
    /// The guest report repository type
    type GuestReportRepo: GuestReportRepository;
    /// The employee repository type
    type EmployeeRepo: EmployeeRepository;
    /// The home repository type
    type GnlHomeRepo: HomeRepository;
    /// The user repository type
    type GnlUserRepo: UserRepository;

    /// Get the guest-not-left service
    fn guest_not_left_service(
        &self,
    ) -> &GuestNotLeftService<
        Self::AssignmentRepo,
        Self::GuestReportRepo,
        Self::EmployeeRepo,
        Self::GnlHomeRepo,
        Self::GnlUserRepo,
    >;
}

/// Trait for states that provide direct database access
/// Used by the readiness probe
pub trait HasDbPool: Clone + Send + Sync + 'static {
    /// Get the database pool
    fn db_pool(&self) -> &sqlx::MySqlPool;
}
