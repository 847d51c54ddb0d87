//! Job assignment repository

use crate::domain::{Appointment, JobAssignment, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

const ASSIGNMENT_COLUMNS: &str = "id, appointment_id, employee_id, business_owner_id, status, \
     guest_not_left_reported, guest_not_left_report_count, last_guest_not_left_at, \
     created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobAssignmentRepository: Send + Sync {
    /// Find assignment by ID
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<JobAssignment>>;

    /// Find the appointment an assignment belongs to
    async fn find_appointment(&self, appointment_id: StringUuid)
        -> Result<Option<Appointment>>;

    /// Record one more guest-not-left observation on the assignment:
    /// sets the flag, bumps the counter, stamps the timestamp.
    /// Returns the new cumulative count.
    async fn record_guest_report(&self, id: StringUuid) -> Result<i32>;

    /// Clear the guest-not-left flag, preserving the counter for history;
    /// returns the number of rows updated (0 = flag was already clear)
    async fn clear_guest_flag(&self, id: StringUuid) -> Result<u64>;

    /// Assignments still flagged whose appointment time has passed without
    /// the job starting
    async fn list_expired_flagged(&self) -> Result<Vec<JobAssignment>>;
}

pub struct JobAssignmentRepositoryImpl {
    pool: MySqlPool,
}

impl JobAssignmentRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobAssignmentRepository for JobAssignmentRepositoryImpl {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<JobAssignment>> {
        let assignment = sqlx::query_as::<_, JobAssignment>(&format!(
            "SELECT {} FROM employee_job_assignments WHERE id = ?",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }

    async fn find_appointment(
        &self,
        appointment_id: StringUuid,
    ) -> Result<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, home_id, client_id, recurring_schedule_id, scheduled_at, price_cents,
                   created_at
            FROM user_appointments
            WHERE id = ?
            "#,
        )
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(appointment)
    }

    async fn record_guest_report(&self, id: StringUuid) -> Result<i32> {
        sqlx::query(
            r#"
            UPDATE employee_job_assignments
            SET guest_not_left_reported = TRUE,
                guest_not_left_report_count = guest_not_left_report_count + 1,
                last_guest_not_left_at = NOW(),
                updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        let row: (i32,) = sqlx::query_as(
            "SELECT guest_not_left_report_count FROM employee_job_assignments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;

        Ok(row.0)
    }

    async fn clear_guest_flag(&self, id: StringUuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE employee_job_assignments
            SET guest_not_left_reported = FALSE, updated_at = NOW()
            WHERE id = ? AND guest_not_left_reported = TRUE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_expired_flagged(&self) -> Result<Vec<JobAssignment>> {
        let assignments = sqlx::query_as::<_, JobAssignment>(
            r#"
            SELECT j.id, j.appointment_id, j.employee_id, j.business_owner_id, j.status,
                   j.guest_not_left_reported, j.guest_not_left_report_count,
                   j.last_guest_not_left_at, j.created_at, j.updated_at
            FROM employee_job_assignments j
            JOIN user_appointments a ON j.appointment_id = a.id
            WHERE j.guest_not_left_reported = TRUE
              AND j.status = 'assigned'
              AND a.scheduled_at < NOW()
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }
}
