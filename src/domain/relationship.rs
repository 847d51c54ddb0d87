//! Cleaner-client relationship domain types
//!
//! A relationship row starts life as an invitation and carries the full
//! invitation snapshot so the invited client can sign up without an
//! account. Status is an explicit state machine; services and routers
//! match on the enum, never on strings.

use super::address::AddressInput;
use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Invite tokens are exactly this many characters
pub const INVITE_TOKEN_LEN: usize = 32;

/// Relationship status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    PendingInvite,
    Active,
    Inactive,
    Declined,
    Cancelled,
}

impl std::str::FromStr for RelationshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending_invite" => Ok(Self::PendingInvite),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "declined" => Ok(Self::Declined),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown relationship status: {}", s)),
        }
    }
}

impl std::fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingInvite => write!(f, "pending_invite"),
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Declined => write!(f, "declined"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for RelationshipStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for RelationshipStatus {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for RelationshipStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

/// Cleaner-client relationship entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientRelationship {
    pub id: StringUuid,
    pub cleaner_id: StringUuid,
    pub client_id: Option<StringUuid>,
    pub home_id: Option<StringUuid>,
    pub invite_token: String,
    pub invited_email: String,
    pub invited_name: String,
    pub invited_phone: Option<String>,
    pub invited_address: Option<String>,
    pub invited_beds: Option<i32>,
    pub invited_baths: Option<i32>,
    pub invited_notes: Option<String>,
    pub status: RelationshipStatus,
    pub invited_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub last_invite_reminder_at: Option<DateTime<Utc>>,
    pub default_frequency: Option<String>,
    pub default_price_cents: Option<i64>,
    pub default_time_window: Option<String>,
    pub auto_pay: bool,
    pub auto_schedule: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ClientRelationship {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            cleaner_id: StringUuid::new_v4(),
            client_id: None,
            home_id: None,
            invite_token: String::new(),
            invited_email: String::new(),
            invited_name: String::new(),
            invited_phone: None,
            invited_address: None,
            invited_beds: None,
            invited_baths: None,
            invited_notes: None,
            status: RelationshipStatus::default(),
            invited_at: now,
            accepted_at: None,
            last_invite_reminder_at: None,
            default_frequency: None,
            default_price_cents: None,
            default_time_window: None,
            auto_pay: true,
            auto_schedule: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// How a looked-up token may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteDisposition {
    /// Pending invite, eligible for acceptance
    Redeemable,
    /// Cancelled by the cleaner; the token still creates an account but the
    /// relationship must not be re-established
    Cancelled,
    /// Already accepted (relationship active or since deactivated)
    AlreadyAccepted,
    /// Declined by the client
    Declined,
}

/// A token lookup result: the invitation plus how it may be used
#[derive(Debug, Clone)]
pub struct ValidatedInvite {
    pub invite: ClientRelationship,
    pub disposition: InviteDisposition,
}

impl ValidatedInvite {
    pub fn is_cancelled(&self) -> bool {
        self.disposition == InviteDisposition::Cancelled
    }
}

impl From<RelationshipStatus> for InviteDisposition {
    fn from(status: RelationshipStatus) -> Self {
        match status {
            RelationshipStatus::PendingInvite => Self::Redeemable,
            RelationshipStatus::Cancelled => Self::Cancelled,
            RelationshipStatus::Active | RelationshipStatus::Inactive => Self::AlreadyAccepted,
            RelationshipStatus::Declined => Self::Declined,
        }
    }
}

/// Input for creating a new invitation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvitationInput {
    /// Email address to invite
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(max = 30))]
    pub phone: Option<String>,

    #[validate(nested)]
    pub address: Option<AddressInput>,

    #[validate(range(min = 0, max = 20))]
    pub beds: Option<i32>,

    #[validate(range(min = 0, max = 20))]
    pub baths: Option<i32>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Input for accepting an invitation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AcceptInvitationInput {
    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 30))]
    pub phone: Option<String>,

    /// Field-by-field corrections over the invited address
    #[validate(nested)]
    pub address_corrections: Option<AddressInput>,
}

/// API response for a relationship (token withheld from lists; it only
/// travels inside the invitation email)
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipResponse {
    pub id: StringUuid,
    pub cleaner_id: StringUuid,
    pub client_id: Option<StringUuid>,
    pub home_id: Option<StringUuid>,
    pub invited_email: String,
    pub invited_name: String,
    pub status: RelationshipStatus,
    pub invited_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub last_invite_reminder_at: Option<DateTime<Utc>>,
    pub default_frequency: Option<String>,
    pub default_price_cents: Option<i64>,
    pub auto_pay: bool,
    pub auto_schedule: bool,
}

impl From<ClientRelationship> for RelationshipResponse {
    fn from(r: ClientRelationship) -> Self {
        Self {
            id: r.id,
            cleaner_id: r.cleaner_id,
            client_id: r.client_id,
            home_id: r.home_id,
            invited_email: r.invited_email,
            invited_name: r.invited_name,
            status: r.status,
            invited_at: r.invited_at,
            accepted_at: r.accepted_at,
            last_invite_reminder_at: r.last_invite_reminder_at,
            default_frequency: r.default_frequency,
            default_price_cents: r.default_price_cents,
            auto_pay: r.auto_pay,
            auto_schedule: r.auto_schedule,
        }
    }
}
