//! Billing repository
//!
//! Only the two operations the invitation/deactivation flows need: the
//! zero-balance row every new account gets, and balance adjustments when
//! future appointments are cancelled.

use crate::domain::StringUuid;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingRepository: Send + Sync {
    /// Create the zero-balance bill row for a new user
    async fn create_zero_balance(&self, user_id: StringUuid) -> Result<()>;

    /// Add a (possibly negative) amount to the user's outstanding balance
    async fn adjust_balance(&self, user_id: StringUuid, delta_cents: i64) -> Result<()>;
}

pub struct BillingRepositoryImpl {
    pool: MySqlPool,
}

impl BillingRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingRepository for BillingRepositoryImpl {
    async fn create_zero_balance(&self, user_id: StringUuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_bills (id, user_id, balance_cents, created_at, updated_at)
            VALUES (?, ?, 0, NOW(), NOW())
            "#,
        )
        .bind(StringUuid::new_v4())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn adjust_balance(&self, user_id: StringUuid, delta_cents: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_bills
            SET balance_cents = balance_cents + ?, updated_at = NOW()
            WHERE user_id = ?
            "#,
        )
        .bind(delta_cents)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_mock_adjust_balance_negative_delta() {
        let mut mock = MockBillingRepository::new();
        let user_id = StringUuid::new_v4();

        mock.expect_adjust_balance()
            .with(eq(user_id), eq(-15000))
            .returning(|_, _| Ok(()));

        assert!(mock.adjust_balance(user_id, -15000).await.is_ok());
    }
}
