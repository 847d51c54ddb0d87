//! Employee repository

use crate::domain::{Employee, StringUuid};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// The active employee record for a user, if any
    async fn find_active_by_user(&self, user_id: StringUuid) -> Result<Option<Employee>>;
}

pub struct EmployeeRepositoryImpl {
    pool: MySqlPool,
}

impl EmployeeRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for EmployeeRepositoryImpl {
    async fn find_active_by_user(&self, user_id: StringUuid) -> Result<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, user_id, business_owner_id, status, created_at
            FROM employees
            WHERE user_id = ? AND status = 'active'
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_mock_find_active_by_user() {
        let mut mock = MockEmployeeRepository::new();
        let user_id = StringUuid::new_v4();

        mock.expect_find_active_by_user()
            .with(eq(user_id))
            .returning(move |user_id| {
                Ok(Some(Employee {
                    user_id,
                    ..Default::default()
                }))
            });

        let employee = mock.find_active_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(employee.user_id, user_id);
    }
}
