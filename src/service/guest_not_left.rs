//! Guest-not-left reporting and escalation
//!
//! Cleaners in the field report that the previous occupant has not
//! vacated; the homeowner is nudged by push, and the business owner is
//! pulled in once reports pile up. A periodic sweep closes out flags on
//! jobs whose appointment time passed without the job starting.

use crate::domain::{
    distance_meters, AssignmentStatus, GeoPoint, GuestNotLeftReport, JobAssignment,
    ReportResolution, StringUuid,
};
use crate::email::{EmailAddress, EmailMessage};
use crate::error::{AppError, Result};
use crate::push::PushMessage;
use crate::repository::{
    EmployeeRepository, GuestReportRepository, HomeRepository, JobAssignmentRepository,
    UserRepository,
};
use crate::repository::guest_report::NewGuestReport;
use crate::service::NotificationService;
use serde::Serialize;
use std::sync::Arc;

/// Reports on one assignment before the business owner is pulled in.
/// Fixed by policy, not configuration.
const ESCALATION_THRESHOLD: i32 = 3;

/// Result of a report call
#[derive(Debug, Serialize)]
pub struct GuestReportOutcome {
    pub report: GuestNotLeftReport,
    pub report_count: i32,
    pub homeowner_notified: bool,
    pub message: String,
}

/// Service for the guest-not-left workflow
pub struct GuestNotLeftService<AR, GR, ER, HR, UR>
where
    AR: JobAssignmentRepository,
    GR: GuestReportRepository,
    ER: EmployeeRepository,
    HR: HomeRepository,
    UR: UserRepository,
{
    assignment_repo: Arc<AR>,
    report_repo: Arc<GR>,
    employee_repo: Arc<ER>,
    home_repo: Arc<HR>,
    user_repo: Arc<UR>,
    notifications: Arc<NotificationService>,
}

impl<AR, GR, ER, HR, UR> GuestNotLeftService<AR, GR, ER, HR, UR>
where
    AR: JobAssignmentRepository,
    GR: GuestReportRepository,
    ER: EmployeeRepository,
    HR: HomeRepository,
    UR: UserRepository,
{
    pub fn new(
        assignment_repo: Arc<AR>,
        report_repo: Arc<GR>,
        employee_repo: Arc<ER>,
        home_repo: Arc<HR>,
        user_repo: Arc<UR>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            assignment_repo,
            report_repo,
            employee_repo,
            home_repo,
            user_repo,
            notifications,
        }
    }

    /// Record a "tenant still present" observation from the field
    pub async fn report(
        &self,
        assignment_id: StringUuid,
        reporter_user_id: StringUuid,
        location: Option<GeoPoint>,
        notes: Option<String>,
    ) -> Result<GuestReportOutcome> {
        let employee = self
            .employee_repo
            .find_active_by_user(reporter_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Employee record not found".to_string()))?;

        let assignment = self
            .assignment_repo
            .find_by_id(assignment_id)
            .await?
            .filter(|a| a.status == AssignmentStatus::Assigned)
            .ok_or_else(|| {
                AppError::NotFound("Assignment not found or job already started".to_string())
            })?;

        // Direct assignment, or the business owner reporting on their own job
        let is_assigned = assignment.employee_id == employee.id
            || assignment.business_owner_id == reporter_user_id;
        if !is_assigned {
            return Err(AppError::Forbidden("Not assigned to this job".to_string()));
        }

        let appointment = self
            .assignment_repo
            .find_appointment(assignment.appointment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

        let distance_from_home_m = match location {
            Some(cleaner_location) => self
                .home_repo
                .find_by_id(appointment.home_id)
                .await?
                .and_then(|home| home.location())
                .map(|home_location| distance_meters(cleaner_location, home_location)),
            None => None,
        };

        let report = self
            .report_repo
            .create(&NewGuestReport {
                assignment_id,
                appointment_id: appointment.id,
                reported_by: reporter_user_id,
                cleaner_latitude: location.map(|l| l.latitude),
                cleaner_longitude: location.map(|l| l.longitude),
                distance_from_home_m,
                notes,
            })
            .await?;

        let report_count = self.assignment_repo.record_guest_report(assignment_id).await?;

        // First report reads softer than repeats
        let message = if report_count <= 1 {
            "Your cleaner has arrived, but it looks like the previous guest hasn't left yet."
                .to_string()
        } else {
            "Your cleaner is still waiting to start: the previous guest has not left."
                .to_string()
        };

        let homeowner_notified = self
            .notifications
            .push_to_user(PushMessage::new(
                appointment.client_id,
                "Guest still present",
                message.as_str(),
            ))
            .await;

        if report_count == ESCALATION_THRESHOLD {
            self.escalate(&assignment, report_count).await;
        }

        Ok(GuestReportOutcome {
            report,
            report_count,
            homeowner_notified,
            message,
        })
    }

    /// Clear the flag when a job proceeds. No-op when the flag is
    /// already clear; the counter is preserved for history.
    pub async fn clear_flag(&self, assignment_id: StringUuid) -> Result<u64> {
        let assignment = self
            .assignment_repo
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

        if !assignment.guest_not_left_reported {
            return Ok(0);
        }

        self.assignment_repo.clear_guest_flag(assignment_id).await?;
        self.report_repo
            .resolve_for_assignment(assignment_id, ReportResolution::JobCompleted)
            .await
    }

    /// Close out flagged assignments whose appointment time passed
    /// without the job starting. Cron-invoked; idempotent per
    /// assignment since cleared flags drop out of the scan.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let expired = self.assignment_repo.list_expired_flagged().await?;
        let mut swept = 0u64;

        for assignment in expired {
            self.report_repo
                .resolve_for_assignment(assignment.id, ReportResolution::Expired)
                .await?;
            self.assignment_repo.clear_guest_flag(assignment.id).await?;

            self.notify_owner(
                &assignment,
                "Job expired with guest present",
                format!(
                    "Job {} never started: the guest-not-left window expired after {} report(s).",
                    assignment.id, assignment.guest_not_left_report_count
                ),
                true,
            )
            .await;

            swept += 1;
        }

        if swept > 0 {
            tracing::info!("Swept {} expired guest-not-left assignments", swept);
        }

        Ok(swept)
    }

    async fn escalate(&self, assignment: &JobAssignment, report_count: i32) {
        self.notify_owner(
            assignment,
            "Repeated guest-not-left reports",
            format!(
                "Job {} has {} guest-not-left reports and has not started. \
                 The cleaner may need rescheduling guidance.",
                assignment.id, report_count
            ),
            false,
        )
        .await;
    }

    /// Push (action required) plus email to the business owner;
    /// best-effort on both channels
    async fn notify_owner(
        &self,
        assignment: &JobAssignment,
        title: &str,
        body: String,
        high_priority: bool,
    ) {
        let mut push = PushMessage::new(assignment.business_owner_id, title, body.as_str())
            .action_required();
        if high_priority {
            push = push.high_priority();
        }
        self.notifications.push_to_user(push).await;

        match self.user_repo.find_by_id(assignment.business_owner_id).await {
            Ok(Some(owner)) => {
                let message = EmailMessage::new(
                    EmailAddress::with_name(&owner.email, owner.display_name()),
                    title,
                    format!("<p>{}</p>", body),
                )
                .with_text_body(body);
                self.notifications.email_to(message).await;
            }
            Ok(None) => {
                tracing::warn!(
                    "Business owner {} not found for escalation email",
                    assignment.business_owner_id
                );
            }
            Err(e) => {
                tracing::warn!("Failed to load business owner for escalation: {}", e);
            }
        }
    }
}
