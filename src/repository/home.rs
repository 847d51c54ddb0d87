//! Home repository

use crate::domain::{CreateHomeInput, Home, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

const HOME_COLUMNS: &str = "id, owner_id, address_line1, address_line2, city, state, \
     postal_code, beds, baths, latitude, longitude, preferred_cleaner_id, is_setup_complete, \
     created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HomeRepository: Send + Sync {
    /// Create a home row
    async fn create(&self, input: &CreateHomeInput) -> Result<Home>;

    /// Find home by ID
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Home>>;

    /// Point the home at its default cleaner
    async fn set_preferred_cleaner(&self, id: StringUuid, cleaner_id: StringUuid) -> Result<()>;
}

pub struct HomeRepositoryImpl {
    pool: MySqlPool,
}

impl HomeRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HomeRepository for HomeRepositoryImpl {
    async fn create(&self, input: &CreateHomeInput) -> Result<Home> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO user_homes
                (id, owner_id, address_line1, address_line2, city, state, postal_code,
                 beds, baths, is_setup_complete, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(input.owner_id)
        .bind(&input.address_line1)
        .bind(&input.address_line2)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.postal_code)
        .bind(input.beds)
        .bind(input.baths)
        .bind(input.is_setup_complete)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create home")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Home>> {
        let home = sqlx::query_as::<_, Home>(&format!(
            "SELECT {} FROM user_homes WHERE id = ?",
            HOME_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(home)
    }

    async fn set_preferred_cleaner(&self, id: StringUuid, cleaner_id: StringUuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_homes
            SET preferred_cleaner_id = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(cleaner_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
