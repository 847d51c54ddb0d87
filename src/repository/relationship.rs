//! Cleaner-client relationship repository

use crate::domain::{ClientRelationship, RelationshipStatus, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Everything persisted at invitation time
#[derive(Debug, Clone)]
pub struct InvitationSnapshot {
    pub token: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub beds: Option<i32>,
    pub baths: Option<i32>,
    pub notes: Option<String>,
}

const RELATIONSHIP_COLUMNS: &str = "id, cleaner_id, client_id, home_id, invite_token, \
     invited_email, invited_name, invited_phone, invited_address, invited_beds, invited_baths, \
     invited_notes, status, invited_at, accepted_at, last_invite_reminder_at, default_frequency, \
     default_price_cents, default_time_window, auto_pay, auto_schedule, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRelationshipRepository: Send + Sync {
    /// Create a new pending invitation row
    async fn create(
        &self,
        cleaner_id: StringUuid,
        snapshot: &InvitationSnapshot,
    ) -> Result<ClientRelationship>;

    /// Find by ID
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<ClientRelationship>>;

    /// Find by ID, scoped to the owning cleaner
    async fn find_owned(
        &self,
        id: StringUuid,
        cleaner_id: StringUuid,
    ) -> Result<Option<ClientRelationship>>;

    /// Find by invite token
    async fn find_by_token(&self, token: &str) -> Result<Option<ClientRelationship>>;

    /// Whether a token is already in use
    async fn token_exists(&self, token: &str) -> Result<bool>;

    /// The pending or active row for a (cleaner, email) pair, active first
    async fn find_pending_or_active(
        &self,
        cleaner_id: StringUuid,
        email: &str,
    ) -> Result<Option<ClientRelationship>>;

    /// List a cleaner's relationships, active first then most recent
    async fn list_by_cleaner(
        &self,
        cleaner_id: StringUuid,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<ClientRelationship>>;

    /// Link the accepted invitation to the new client and home.
    /// Guarded on `pending_invite` so a concurrent accept loses cleanly;
    /// returns the number of rows updated (0 = lost the race).
    async fn accept_linked(
        &self,
        id: StringUuid,
        client_id: StringUuid,
        home_id: Option<StringUuid>,
    ) -> Result<u64>;

    /// Stamp accepted_at only (cancelled-invite signup; no linkage)
    async fn accept_unlinked(&self, id: StringUuid) -> Result<()>;

    /// Decline a pending invitation by token; returns rows updated
    async fn decline(&self, token: &str) -> Result<u64>;

    /// Update status
    async fn update_status(
        &self,
        id: StringUuid,
        status: RelationshipStatus,
    ) -> Result<ClientRelationship>;

    /// Stamp the reminder timestamp on an owned pending invitation;
    /// returns rows updated
    async fn touch_reminder(&self, id: StringUuid, cleaner_id: StringUuid) -> Result<u64>;
}

pub struct ClientRelationshipRepositoryImpl {
    pool: MySqlPool,
}

impl ClientRelationshipRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRelationshipRepository for ClientRelationshipRepositoryImpl {
    async fn create(
        &self,
        cleaner_id: StringUuid,
        snapshot: &InvitationSnapshot,
    ) -> Result<ClientRelationship> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO cleaner_clients
                (id, cleaner_id, invite_token, invited_email, invited_name, invited_phone,
                 invited_address, invited_beds, invited_baths, invited_notes, status,
                 invited_at, auto_pay, auto_schedule, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending_invite', NOW(), TRUE, TRUE, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(cleaner_id)
        .bind(&snapshot.token)
        .bind(&snapshot.email)
        .bind(&snapshot.name)
        .bind(&snapshot.phone)
        .bind(&snapshot.address)
        .bind(snapshot.beds)
        .bind(snapshot.baths)
        .bind(&snapshot.notes)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create invitation")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<ClientRelationship>> {
        let relationship = sqlx::query_as::<_, ClientRelationship>(&format!(
            "SELECT {} FROM cleaner_clients WHERE id = ?",
            RELATIONSHIP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn find_owned(
        &self,
        id: StringUuid,
        cleaner_id: StringUuid,
    ) -> Result<Option<ClientRelationship>> {
        let relationship = sqlx::query_as::<_, ClientRelationship>(&format!(
            "SELECT {} FROM cleaner_clients WHERE id = ? AND cleaner_id = ?",
            RELATIONSHIP_COLUMNS
        ))
        .bind(id)
        .bind(cleaner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ClientRelationship>> {
        let relationship = sqlx::query_as::<_, ClientRelationship>(&format!(
            "SELECT {} FROM cleaner_clients WHERE invite_token = ?",
            RELATIONSHIP_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn token_exists(&self, token: &str) -> Result<bool> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM cleaner_clients WHERE invite_token = ?")
                .bind(token)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0 > 0)
    }

    async fn find_pending_or_active(
        &self,
        cleaner_id: StringUuid,
        email: &str,
    ) -> Result<Option<ClientRelationship>> {
        let relationship = sqlx::query_as::<_, ClientRelationship>(&format!(
            r#"
            SELECT {}
            FROM cleaner_clients
            WHERE cleaner_id = ? AND invited_email = ? AND status IN ('pending_invite', 'active')
            ORDER BY (status = 'active') DESC, created_at DESC
            LIMIT 1
            "#,
            RELATIONSHIP_COLUMNS
        ))
        .bind(cleaner_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(relationship)
    }

    async fn list_by_cleaner(
        &self,
        cleaner_id: StringUuid,
        status: Option<RelationshipStatus>,
    ) -> Result<Vec<ClientRelationship>> {
        let relationships = if let Some(status) = status {
            sqlx::query_as::<_, ClientRelationship>(&format!(
                r#"
                SELECT {}
                FROM cleaner_clients
                WHERE cleaner_id = ? AND status = ?
                ORDER BY invited_at DESC
                "#,
                RELATIONSHIP_COLUMNS
            ))
            .bind(cleaner_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, ClientRelationship>(&format!(
                r#"
                SELECT {}
                FROM cleaner_clients
                WHERE cleaner_id = ?
                ORDER BY (status = 'active') DESC, invited_at DESC
                "#,
                RELATIONSHIP_COLUMNS
            ))
            .bind(cleaner_id)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(relationships)
    }

    async fn accept_linked(
        &self,
        id: StringUuid,
        client_id: StringUuid,
        home_id: Option<StringUuid>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE cleaner_clients
            SET client_id = ?, home_id = ?, status = 'active', accepted_at = NOW(),
                updated_at = NOW()
            WHERE id = ? AND status = 'pending_invite'
            "#,
        )
        .bind(client_id)
        .bind(home_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn accept_unlinked(&self, id: StringUuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE cleaner_clients
            SET accepted_at = NOW(), updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn decline(&self, token: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE cleaner_clients
            SET status = 'declined', updated_at = NOW()
            WHERE invite_token = ? AND status = 'pending_invite'
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_status(
        &self,
        id: StringUuid,
        status: RelationshipStatus,
    ) -> Result<ClientRelationship> {
        sqlx::query(
            r#"
            UPDATE cleaner_clients
            SET status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Relationship {} not found", id)))
    }

    async fn touch_reminder(&self, id: StringUuid, cleaner_id: StringUuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE cleaner_clients
            SET last_invite_reminder_at = NOW(), updated_at = NOW()
            WHERE id = ? AND cleaner_id = ? AND status = 'pending_invite'
            "#,
        )
        .bind(id)
        .bind(cleaner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
