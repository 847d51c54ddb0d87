//! Guest-not-left report repository

use crate::domain::{GuestNotLeftReport, ReportResolution, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// A new observation to persist
#[derive(Debug, Clone)]
pub struct NewGuestReport {
    pub assignment_id: StringUuid,
    pub appointment_id: StringUuid,
    pub reported_by: StringUuid,
    pub cleaner_latitude: Option<f64>,
    pub cleaner_longitude: Option<f64>,
    pub distance_from_home_m: Option<f64>,
    pub notes: Option<String>,
}

const REPORT_COLUMNS: &str = "id, assignment_id, appointment_id, reported_by, reported_at, \
     cleaner_latitude, cleaner_longitude, distance_from_home_m, notes, resolved, resolved_at, \
     resolution";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuestReportRepository: Send + Sync {
    /// Persist a new report
    async fn create(&self, report: &NewGuestReport) -> Result<GuestNotLeftReport>;

    /// Find report by ID
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<GuestNotLeftReport>>;

    /// Resolve every unresolved report on an assignment; returns the
    /// number of reports closed
    async fn resolve_for_assignment(
        &self,
        assignment_id: StringUuid,
        resolution: ReportResolution,
    ) -> Result<u64>;
}

pub struct GuestReportRepositoryImpl {
    pool: MySqlPool,
}

impl GuestReportRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestReportRepository for GuestReportRepositoryImpl {
    async fn create(&self, report: &NewGuestReport) -> Result<GuestNotLeftReport> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO guest_not_left_reports
                (id, assignment_id, appointment_id, reported_by, reported_at,
                 cleaner_latitude, cleaner_longitude, distance_from_home_m, notes, resolved)
            VALUES (?, ?, ?, ?, NOW(), ?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(id)
        .bind(report.assignment_id)
        .bind(report.appointment_id)
        .bind(report.reported_by)
        .bind(report.cleaner_latitude)
        .bind(report.cleaner_longitude)
        .bind(report.distance_from_home_m)
        .bind(&report.notes)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create report")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<GuestNotLeftReport>> {
        let report = sqlx::query_as::<_, GuestNotLeftReport>(&format!(
            "SELECT {} FROM guest_not_left_reports WHERE id = ?",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    async fn resolve_for_assignment(
        &self,
        assignment_id: StringUuid,
        resolution: ReportResolution,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE guest_not_left_reports
            SET resolved = TRUE, resolved_at = NOW(), resolution = ?
            WHERE assignment_id = ? AND resolved = FALSE
            "#,
        )
        .bind(resolution)
        .bind(assignment_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
