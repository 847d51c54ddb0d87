//! Job assignments, appointments, schedules, and guest-not-left reports

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Employment status of a cleaner within a business
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl std::str::FromStr for EmployeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("Unknown employee status: {}", s)),
        }
    }
}

impl std::fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for EmployeeStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for EmployeeStatus {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for EmployeeStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

/// A cleaner's employee record within a business
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: StringUuid,
    pub user_id: StringUuid,
    pub business_owner_id: StringUuid,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
}

impl Default for Employee {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            user_id: StringUuid::new_v4(),
            business_owner_id: StringUuid::new_v4(),
            status: EmployeeStatus::Active,
            created_at: Utc::now(),
        }
    }
}

/// Job assignment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl std::str::FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown assignment status: {}", s)),
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assigned => write!(f, "assigned"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for AssignmentStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for AssignmentStatus {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for AssignmentStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

/// An employee's assignment to one appointment, carrying the
/// guest-not-left state the reporting flow mutates
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobAssignment {
    pub id: StringUuid,
    pub appointment_id: StringUuid,
    pub employee_id: StringUuid,
    pub business_owner_id: StringUuid,
    pub status: AssignmentStatus,
    pub guest_not_left_reported: bool,
    pub guest_not_left_report_count: i32,
    pub last_guest_not_left_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for JobAssignment {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            appointment_id: StringUuid::new_v4(),
            employee_id: StringUuid::new_v4(),
            business_owner_id: StringUuid::new_v4(),
            status: AssignmentStatus::Assigned,
            guest_not_left_reported: false,
            guest_not_left_report_count: 0,
            last_guest_not_left_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A booked cleaning appointment
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: StringUuid,
    pub home_id: StringUuid,
    pub client_id: StringUuid,
    pub recurring_schedule_id: Option<StringUuid>,
    pub scheduled_at: DateTime<Utc>,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Default for Appointment {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            home_id: StringUuid::new_v4(),
            client_id: StringUuid::new_v4(),
            recurring_schedule_id: None,
            scheduled_at: now,
            price_cents: 0,
            created_at: now,
        }
    }
}

/// Resolution recorded when guest-not-left reports are closed out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportResolution {
    JobCompleted,
    Expired,
}

impl std::str::FromStr for ReportResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "job_completed" => Ok(Self::JobCompleted),
            "expired" => Ok(Self::Expired),
            _ => Err(format!("Unknown report resolution: {}", s)),
        }
    }
}

impl std::fmt::Display for ReportResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JobCompleted => write!(f, "job_completed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for ReportResolution {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for ReportResolution {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for ReportResolution {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

/// One "tenant still present" observation from the field
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GuestNotLeftReport {
    pub id: StringUuid,
    pub assignment_id: StringUuid,
    pub appointment_id: StringUuid,
    /// User id of the reporting cleaner
    pub reported_by: StringUuid,
    pub reported_at: DateTime<Utc>,
    pub cleaner_latitude: Option<f64>,
    pub cleaner_longitude: Option<f64>,
    pub distance_from_home_m: Option<f64>,
    pub notes: Option<String>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<ReportResolution>,
}

impl Default for GuestNotLeftReport {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            assignment_id: StringUuid::new_v4(),
            appointment_id: StringUuid::new_v4(),
            reported_by: StringUuid::new_v4(),
            reported_at: Utc::now(),
            cleaner_latitude: None,
            cleaner_longitude: None,
            distance_from_home_m: None,
            notes: None,
            resolved: false,
            resolved_at: None,
            resolution: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_status_roundtrip() {
        for status in [
            AssignmentStatus::Assigned,
            AssignmentStatus::InProgress,
            AssignmentStatus::Completed,
            AssignmentStatus::Cancelled,
        ] {
            assert_eq!(
                status.to_string().parse::<AssignmentStatus>().unwrap(),
                status
            );
        }
    }

    #[test]
    fn test_resolution_roundtrip() {
        assert_eq!(
            "job_completed".parse::<ReportResolution>().unwrap(),
            ReportResolution::JobCompleted
        );
        assert_eq!(
            "expired".parse::<ReportResolution>().unwrap(),
            ReportResolution::Expired
        );
        assert!("done".parse::<ReportResolution>().is_err());
    }

    #[test]
    fn test_fresh_assignment_has_no_guest_state() {
        let assignment = JobAssignment::default();
        assert!(!assignment.guest_not_left_reported);
        assert_eq!(assignment.guest_not_left_report_count, 0);
        assert!(assignment.last_guest_not_left_at.is_none());
    }

    #[test]
    fn test_fresh_report_is_unresolved() {
        let report = GuestNotLeftReport::default();
        assert!(!report.resolved);
        assert!(report.resolution.is_none());
    }
}
