//! Recurring schedule repository and the deactivation cascade

use crate::domain::StringUuid;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

/// What the future-appointment cascade removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelledAppointments {
    pub count: u64,
    pub price_sum_cents: i64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Deactivate every recurring schedule tied to a relationship;
    /// returns the number of schedules touched
    async fn deactivate_for_relationship(&self, relationship_id: StringUuid) -> Result<u64>;

    /// Delete future appointments generated by the relationship's
    /// schedules, cascading their payout and assignment rows.
    /// Past appointments are left for billing history.
    async fn delete_future_appointments(
        &self,
        relationship_id: StringUuid,
    ) -> Result<CancelledAppointments>;
}

pub struct ScheduleRepositoryImpl {
    pool: MySqlPool,
}

impl ScheduleRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for ScheduleRepositoryImpl {
    async fn deactivate_for_relationship(&self, relationship_id: StringUuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE recurring_schedules
            SET active = FALSE, updated_at = NOW()
            WHERE relationship_id = ? AND active = TRUE
            "#,
        )
        .bind(relationship_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_future_appointments(
        &self,
        relationship_id: StringUuid,
    ) -> Result<CancelledAppointments> {
        // Snapshot what is about to be removed, for the response and the
        // bill adjustment
        let (count, price_sum_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), CAST(COALESCE(SUM(a.price_cents), 0) AS SIGNED)
            FROM user_appointments a
            JOIN recurring_schedules s ON a.recurring_schedule_id = s.id
            WHERE s.relationship_id = ? AND a.scheduled_at > NOW()
            "#,
        )
        .bind(relationship_id)
        .fetch_one(&self.pool)
        .await?;

        // Dependent rows first: payouts, then assignments, then the
        // appointments themselves
        sqlx::query(
            r#"
            DELETE p FROM payouts p
            JOIN user_appointments a ON p.appointment_id = a.id
            JOIN recurring_schedules s ON a.recurring_schedule_id = s.id
            WHERE s.relationship_id = ? AND a.scheduled_at > NOW()
            "#,
        )
        .bind(relationship_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            DELETE j FROM employee_job_assignments j
            JOIN user_appointments a ON j.appointment_id = a.id
            JOIN recurring_schedules s ON a.recurring_schedule_id = s.id
            WHERE s.relationship_id = ? AND a.scheduled_at > NOW()
            "#,
        )
        .bind(relationship_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            DELETE a FROM user_appointments a
            JOIN recurring_schedules s ON a.recurring_schedule_id = s.id
            WHERE s.relationship_id = ? AND a.scheduled_at > NOW()
            "#,
        )
        .bind(relationship_id)
        .execute(&self.pool)
        .await?;

        Ok(CancelledAppointments {
            count: count.max(0) as u64,
            price_sum_cents,
        })
    }
}
