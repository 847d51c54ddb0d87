//! Authentication and multi-account sign-in resolution
//!
//! One email may hold several account types. An ambiguous login (no
//! account type supplied, several on file) is not an error: it resolves
//! to a selection request the client renders as an account picker.

use crate::crypto::PasswordHasher;
use crate::domain::{AccountType, User};
use crate::error::{AppError, Result};
use crate::jwt::JwtManager;
use crate::repository::UserRepository;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Login request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,

    /// Required only when the email maps to several accounts
    pub account_type: Option<AccountType>,
}

/// How a login attempt resolved
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials verified; token issued
    Authenticated { token: String, user: User },
    /// The email maps to several accounts and none was selected
    SelectionRequired { account_types: Vec<AccountType> },
}

/// Service for login and account lookups
pub struct AuthService<UR: UserRepository> {
    user_repo: Arc<UR>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: JwtManager,
}

impl<UR: UserRepository> AuthService<UR> {
    pub fn new(user_repo: Arc<UR>, hasher: Arc<dyn PasswordHasher>, jwt: JwtManager) -> Self {
        Self {
            user_repo,
            hasher,
            jwt,
        }
    }

    /// Attempt a login, resolving multi-account ambiguity first
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutcome> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let accounts = self.user_repo.find_by_email(&email).await?;

        let user = match input.account_type {
            Some(selected) => accounts
                .into_iter()
                .find(|account| account.account_type == selected),
            None => {
                if accounts.len() > 1 {
                    let mut account_types: Vec<AccountType> =
                        accounts.iter().map(|a| a.account_type).collect();
                    account_types.sort();
                    account_types.dedup();
                    return Ok(LoginOutcome::SelectionRequired { account_types });
                }
                accounts.into_iter().next()
            }
        };

        // One failure message for unknown email, missing type, and bad
        // password alike
        let user = user.ok_or_else(Self::invalid_credentials)?;

        if !self.hasher.verify(&input.password, &user.password_hash) {
            return Err(Self::invalid_credentials());
        }

        let token = self
            .jwt
            .issue_access_token(user.id.0, &user.email, user.account_type)?;

        Ok(LoginOutcome::Authenticated { token, user })
    }

    /// Account types registered for an email (the pre-login lookup the
    /// sign-in form debounces)
    pub async fn account_types(&self, email: &str) -> Result<Vec<AccountType>> {
        let email = email.trim().to_lowercase();
        let accounts = self.user_repo.find_by_email(&email).await?;

        let mut account_types: Vec<AccountType> =
            accounts.iter().map(|a| a.account_type).collect();
        account_types.sort();
        account_types.dedup();
        Ok(account_types)
    }

    fn invalid_credentials() -> AppError {
        AppError::Unauthorized("Invalid email or password".to_string())
    }
}
