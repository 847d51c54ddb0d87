//! Authentication API handlers

use crate::domain::{AccountType, UserResponse};
use crate::error::Result;
use crate::service::{LoginInput, LoginOutcome};
use crate::state::HasAuth;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

/// Login response: either a token or an account-selection request.
/// Selection is a 200, not an error; the form re-renders with a picker.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Authenticated {
        token: String,
        user: UserResponse,
    },
    SelectionRequired {
        requires_account_selection: bool,
        account_types: Vec<AccountType>,
    },
}

/// Log in, resolving multi-account emails to a selection when needed
pub async fn login<S: HasAuth>(
    State(state): State<S>,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse> {
    let outcome = state.auth_service().login(input).await?;

    let response = match outcome {
        LoginOutcome::Authenticated { token, user } => LoginResponse::Authenticated {
            token,
            user: user.into(),
        },
        LoginOutcome::SelectionRequired { account_types } => LoginResponse::SelectionRequired {
            requires_account_selection: true,
            account_types,
        },
    };

    Ok(Json(response))
}

/// Query parameters for the account lookup
#[derive(Debug, Deserialize)]
pub struct AccountLookupQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AccountLookupResponse {
    pub account_types: Vec<AccountType>,
}

/// The pre-login account lookup the sign-in form debounces
pub async fn accounts<S: HasAuth>(
    State(state): State<S>,
    Query(query): Query<AccountLookupQuery>,
) -> Result<impl IntoResponse> {
    let account_types = state.auth_service().account_types(&query.email).await?;
    Ok(Json(AccountLookupResponse { account_types }))
}
