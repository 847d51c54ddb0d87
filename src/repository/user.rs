//! User repository

use crate::domain::{AccountType, CreateUserInput, StringUuid, User};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

const USER_COLUMNS: &str = "id, email, account_type, first_name, last_name, phone, \
     password_hash, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, input: &CreateUserInput) -> Result<User>;

    /// Find user by ID
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>>;

    /// All accounts registered for an email, across account types
    async fn find_by_email(&self, email: &str) -> Result<Vec<User>>;

    /// The account for an (email, account type) pair
    async fn find_by_email_and_type(
        &self,
        email: &str,
        account_type: AccountType,
    ) -> Result<Option<User>>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO users
                (id, email, account_type, first_name, last_name, phone, password_hash,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.email)
        .bind(input.account_type)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.phone)
        .bind(&input.password_hash)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create user")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ? ORDER BY account_type",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_by_email_and_type(
        &self,
        email: &str,
        account_type: AccountType,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ? AND account_type = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .bind(account_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_mock_find_by_email_multi_account() {
        let mut mock = MockUserRepository::new();

        mock.expect_find_by_email()
            .with(eq("both@example.com"))
            .returning(|email| {
                Ok(vec![
                    User {
                        email: email.to_string(),
                        account_type: AccountType::Homeowner,
                        ..Default::default()
                    },
                    User {
                        email: email.to_string(),
                        account_type: AccountType::Cleaner,
                        ..Default::default()
                    },
                ])
            });

        let users = mock.find_by_email("both@example.com").await.unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_find_by_email_and_type_miss() {
        let mut mock = MockUserRepository::new();

        mock.expect_find_by_email_and_type()
            .returning(|_, _| Ok(None));

        let user = mock
            .find_by_email_and_type("nobody@example.com", AccountType::Homeowner)
            .await
            .unwrap();
        assert!(user.is_none());
    }
}
