//! User domain model
//!
//! The same email may be registered once per account type (a cleaner can
//! also hold a homeowner account); uniqueness is (email, account_type).

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Platform account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Homeowner,
    Cleaner,
    BusinessOwner,
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "homeowner" => Ok(Self::Homeowner),
            "cleaner" => Ok(Self::Cleaner),
            "business_owner" => Ok(Self::BusinessOwner),
            _ => Err(format!("Unknown account type: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Homeowner => write!(f, "homeowner"),
            Self::Cleaner => write!(f, "cleaner"),
            Self::BusinessOwner => write!(f, "business_owner"),
        }
    }
}

impl sqlx::Type<sqlx::MySql> for AccountType {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for AccountType {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for AccountType {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: StringUuid,
    pub email: String,
    pub account_type: AccountType,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Presentation name ("Jane Doe")
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Default for User {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            email: String::new(),
            account_type: AccountType::Homeowner,
            first_name: String::new(),
            last_name: String::new(),
            phone: None,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a new user row
#[derive(Debug, Clone, Validate)]
pub struct CreateUserInput {
    #[validate(email)]
    pub email: String,
    pub account_type: AccountType,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

/// Split a free-form name into (first, last).
///
/// The first whitespace-delimited token is the first name; the remainder is
/// the last name, falling back to the first name when there is no remainder.
pub fn split_invited_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    let last = if rest.is_empty() { first.clone() } else { rest };
    (first, last)
}

/// API-safe user payload (never exposes the password hash)
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: StringUuid,
    pub email: String,
    pub account_type: AccountType,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            account_type: user.account_type,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}
